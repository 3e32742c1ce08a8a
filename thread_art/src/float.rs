use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
};

use num_traits::{ConstOne, ConstZero};

pub trait Float:
    'static
    + Debug
    + Display
    + Default
    + Sync
    + Send
    + Sum
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + num_traits::Float
    + num_traits::NumCast
    + ConstZero
    + ConstOne
{
    const TENTH: Self;
    const TWO_FIVE_FIVE: Self;
    // target dampening applied before the search
    const NINE_TENTHS: Self;
    const LUMA_RED: Self;
    const LUMA_GREEN: Self;
    const LUMA_BLUE: Self;
}

impl Float for f32 {
    const TENTH: Self = 0.1;
    const TWO_FIVE_FIVE: Self = 255.0;
    const NINE_TENTHS: Self = 0.9;
    const LUMA_RED: Self = 0.2989;
    const LUMA_GREEN: Self = 0.5870;
    const LUMA_BLUE: Self = 0.1140;
}

impl Float for f64 {
    const TENTH: Self = 0.1;
    const TWO_FIVE_FIVE: Self = 255.0;
    const NINE_TENTHS: Self = 0.9;
    const LUMA_RED: Self = 0.2989;
    const LUMA_GREEN: Self = 0.5870;
    const LUMA_BLUE: Self = 0.1140;
}
