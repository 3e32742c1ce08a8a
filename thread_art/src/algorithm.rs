use std::{collections::BTreeSet, ops::Range};

use image::GrayImage;
use num_traits::AsPrimitive;
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use crate::{
    board::{self, Board},
    canvas::{self, Canvas},
    config::{self, Background, Config},
    geometry::{LineAa, Point},
    peg_distancer::{self, PegDistancer},
    target::{self, Target},
    verboser::{Message, Verboser},
    Float, Grid,
};

/// Places pegs on `target` according to `config` and runs the search to the
/// end.
pub fn compute<S: Float>(
    target: Target<S>,
    config: Config<S>,
    verboser: &mut impl Verboser,
) -> Result<Computation<S>, Error>
where
    usize: AsPrimitive<S>,
    isize: AsPrimitive<S>,
{
    config.validate()?;
    let board = Board::ellipse(
        target.grid(),
        config.nail_step,
        config.r1_multiplier,
        config.r2_multiplier,
        verboser,
    )?;
    Ok(Algorithm::new(config, board, target)?.compute(verboser))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Initialized,
    Searching,
    StoppedByBudget,
    StoppedByNoImprovement,
}

impl State {
    pub fn is_stopped(self) -> bool {
        matches!(self, State::StoppedByBudget | State::StoppedByNoImprovement)
    }
}

/// A pull accepted by the search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pull<S> {
    pub from: usize,
    pub to: usize,
    pub improvement: S,
    /// Euclidean length of the pull, in pixels.
    pub chord: S,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome<S> {
    Pulled(Pull<S>),
    Stopped(State),
}

#[derive(Clone, Copy, Debug)]
struct Candidate<S> {
    peg: usize,
    improvement: S,
}

struct BatchBuffer<S> {
    range: Range<usize>,
    result: Option<Candidate<S>>,
}

impl<S> BatchBuffer<S> {
    /// Splits `0..count` into at most `batches` contiguous ranges, in order.
    fn split(count: usize, batches: usize) -> Vec<Self> {
        let chunk_size = count.div_ceil(batches.max(1)).max(1);
        (0..count)
            .step_by(chunk_size)
            .map(|start| BatchBuffer {
                range: start..count.min(start + chunk_size),
                result: None,
            })
            .collect()
    }
}

/// Greedy search state: the canvas drawn so far, the peg the thread hangs
/// from and the pulls accepted until now.
pub struct Algorithm<S> {
    config: Config<S>,
    board: Board,
    target: Target<S>,
    canvas: Canvas<S>,
    distancer: PegDistancer,
    steps: Vec<usize>,
    current: usize,
    length: S,
    state: State,
    buffers: Vec<BatchBuffer<S>>,
}

impl<S: Float> Algorithm<S>
where
    isize: AsPrimitive<S>,
{
    pub fn new(config: Config<S>, board: Board, target: Target<S>) -> Result<Self, Error> {
        config.validate()?;
        config.validate_target(target.grid())?;
        if board.grid() != target.grid() {
            return Err(Error::Mismatch {
                board: board.grid(),
                target: target.grid(),
            });
        }
        let distancer = PegDistancer::new(board.len(), config.min_peg_distance)?;
        Ok(Self {
            canvas: Canvas::new(target.grid(), config.background),
            buffers: BatchBuffer::split(board.len(), num_cpus::get()),
            steps: vec![0],
            current: 0,
            length: S::ZERO,
            state: State::Initialized,
            distancer,
            config,
            board,
            target,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn pull_sequence(&self) -> &[usize] {
        &self.steps
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn thread_length(&self) -> S {
        self.length
    }

    /// Runs one greedy step.
    pub fn step(&mut self) -> StepOutcome<S> {
        if self.state.is_stopped() {
            return StepOutcome::Stopped(self.state);
        }
        self.state = State::Searching;

        let best = match self.get_best_peg() {
            Some(best) if best.improvement > S::ZERO => best,
            _ => {
                self.state = State::StoppedByNoImprovement;
                return StepOutcome::Stopped(self.state);
            }
        };

        let pegs = self.board.pegs();
        let (from, to) = (pegs[self.current], pegs[best.peg]);
        self.canvas
            .commit(LineAa::new(from, to), self.config.line_strength);
        let chord = from.as_::<S>().distance(&to.as_::<S>());
        let pull = Pull {
            from: self.current,
            to: best.peg,
            improvement: best.improvement,
            chord,
        };
        self.length += chord;
        self.current = best.peg;
        self.steps.push(best.peg);
        tracing::debug!(
            step = self.steps.len() - 1,
            from = pull.from,
            to = pull.to,
            improvement = %pull.improvement,
            "pull accepted"
        );

        if self.steps.len() > self.config.pull_budget {
            self.state = State::StoppedByBudget;
        }
        StepOutcome::Pulled(pull)
    }

    /// Runs steps until the budget is spent or no pull improves the canvas.
    pub fn compute(mut self, verboser: &mut impl Verboser) -> Computation<S> {
        loop {
            verboser.verbose(Message::Computing(self.steps.len()));
            match self.step() {
                StepOutcome::Pulled(pull) => {
                    verboser.verbose(Message::Pulled(self.steps.len() - 1, pull.to))
                }
                StepOutcome::Stopped(state) => {
                    tracing::info!(
                        reason = ?state,
                        pulls = self.steps.len() - 1,
                        length = %self.length,
                        "search finished"
                    );
                    return Computation {
                        config: self.config,
                        board: self.board,
                        canvas: self.canvas,
                        steps: self.steps,
                        length: self.length,
                        state,
                    };
                }
            }
        }
    }

    /// Scores every candidate peg from the current one. Batches are scanned
    /// in parallel and reduced in peg order; the first maximum wins.
    fn get_best_peg(&mut self) -> Option<Candidate<S>> {
        let current = self.current;
        let config = &self.config;
        let board = &self.board;
        let target = &self.target;
        let canvas = &self.canvas;
        let distancer = &self.distancer;
        let from = board.pegs()[current];

        self.buffers.par_iter_mut().for_each(|buffer| {
            buffer.result = None;
            for peg in buffer.range.clone() {
                if peg == current && !config.allow_self_pull {
                    continue;
                }
                if !distancer.is_valid(current, peg) {
                    continue;
                }
                let line = LineAa::new(from, board.pegs()[peg]);
                let improvement = canvas.improvement_unchecked(line, config.line_strength, target);
                if buffer
                    .result
                    .map_or(true, |best| improvement > best.improvement)
                {
                    buffer.result = Some(Candidate { peg, improvement });
                }
            }
        });

        self.buffers
            .iter()
            .filter_map(|buffer| buffer.result)
            .fold(None, |best: Option<Candidate<S>>, candidate| match best {
                Some(best) if candidate.improvement <= best.improvement => Some(best),
                _ => Some(candidate),
            })
    }
}

/// Finished run: the pull sequence and everything needed to render it.
pub struct Computation<S> {
    config: Config<S>,
    board: Board,
    canvas: Canvas<S>,
    steps: Vec<usize>,
    length: S,
    state: State,
}

impl<S: Float> Computation<S>
where
    isize: AsPrimitive<S>,
{
    pub fn pull_sequence(&self) -> &[usize] {
        &self.steps
    }

    /// Number of accepted pulls.
    pub fn pulls(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &Config<S> {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Thread used, in pixels.
    pub fn thread_length(&self) -> S {
        self.length
    }

    /// Thread used on a physical board `board_size_cm` across.
    pub fn thread_length_cm(&self, board_size_cm: S) -> S
    where
        usize: AsPrimitive<S>,
    {
        self.length / self.board.grid().width.as_() * board_size_cm
    }

    pub fn unique_pegs(&self) -> usize {
        self.steps.iter().collect::<BTreeSet<_>>().len()
    }

    /// Draws the first `len` entries of the pull sequence on an empty canvas.
    pub fn replay(&self, len: usize) -> Canvas<S> {
        let mut canvas = Canvas::new(self.board.grid(), self.config.background);
        let pegs = self.board.pegs();
        for pair in self.steps[..len.min(self.steps.len())].windows(2) {
            canvas.commit(
                LineAa::new(pegs[pair[0]], pegs[pair[1]]),
                self.config.line_strength,
            );
        }
        canvas
    }

    pub fn build_luma(&self, len: usize) -> Result<GrayImage, canvas::Error>
    where
        S: AsPrimitive<u8>,
    {
        self.replay(len).to_luma()
    }

    pub fn build_svg(&self, line_thickness: S) -> svg::Document {
        let grid = self.board.grid();
        let background = match self.config.background {
            Background::White => "white",
            Background::Black => "black",
        };
        let ink = if self.config.line_strength < S::ZERO {
            "black"
        } else {
            "white"
        };
        let mut doc = svg::Document::new()
            .set("viewBox", format!("0 0 {} {}", grid.width, grid.height))
            .add(
                svg::node::element::Rectangle::new()
                    .set("width", grid.width.to_string())
                    .set("height", grid.height.to_string())
                    .set("fill", background),
            );
        for peg in self.board.pegs() {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", peg.x.to_string())
                    .set("cy", peg.y.to_string())
                    .set("r", "0.5")
                    .set("fill", "gray"),
            );
        }
        let pegs = self.board.pegs();
        for pair in self.steps.windows(2) {
            let (start, end) = (pegs[pair[0]], pegs[pair[1]]);
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", start.x.to_string())
                    .set("y1", start.y.to_string())
                    .set("x2", end.x.to_string())
                    .set("y2", end.y.to_string())
                    .set("stroke", ink)
                    .set("stroke-width", format!("{:.4}", line_thickness))
                    .set(
                        "stroke-opacity",
                        format!("{:.4}", self.config.line_strength.abs()),
                    ),
            );
        }
        doc
    }

    /// Text instructions: thread length, pegs used and the sequence itself.
    pub fn build_instructions(&self, board_size_cm: S) -> String
    where
        usize: AsPrimitive<S>,
    {
        let sequence: Vec<String> = self.steps.iter().map(ToString::to_string).collect();
        format!(
            "Estimated total thread length: {:.2} cm\nTotal unique nails used: {}\nThread pull sequence:\n{}",
            self.thread_length_cm(board_size_cm),
            self.unique_pegs(),
            sequence.join("-"),
        )
    }

    /// Peg positions, in pull order, for the first `len` entries.
    pub fn path(&self, len: usize) -> impl Iterator<Item = Point<isize>> + '_ {
        let pegs = self.board.pegs();
        self.steps[..len.min(self.steps.len())]
            .iter()
            .map(move |&peg| pegs[peg])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Board(#[from] board::Error),
    #[error(transparent)]
    Target(#[from] target::Error),
    #[error(transparent)]
    PegDistancer(#[from] peg_distancer::Error),
    #[error("Board is {board:?} but the target is {target:?}")]
    Mismatch { board: Grid, target: Grid },
}
