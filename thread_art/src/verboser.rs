pub enum Message {
    /// Number of pegs kept on the ring.
    PlacingPegs(usize),
    /// Greedy step about to be searched.
    Computing(usize),
    /// A pull was accepted: step number and destination peg.
    Pulled(usize, usize),
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}
