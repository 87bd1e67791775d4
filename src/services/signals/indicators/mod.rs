//! Technical indicator implementations.
//!
//! Every function takes chronologically ascending input and returns a
//! series of the same length. `None` marks positions without enough
//! history, or whose window contains a non-finite input. Input shorter
//! than the window yields an all-`None` series rather than an error.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod williams_r;

pub use atr::{atr, true_range, Atr};
pub use bollinger::{bollinger, Bollinger, BollingerBands};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdSeries};
pub use momentum::{momentum, rate_of_change, Momentum, RateOfChange};
pub use rsi::{rsi, Rsi};
pub use sma::{sma, Sma};
pub use stochastic::{stochastic, Stochastic, StochasticSeries};
pub use williams_r::{williams_r, WilliamsR};

/// An indicator output aligned with its input. `None` is undefined.
pub type Series = Vec<Option<f64>>;

/// All-undefined series of the given length.
pub fn undefined(len: usize) -> Series {
    vec![None; len]
}

/// Value at the last position, if defined.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Apply `f` to every trailing window of `window` values.
pub(crate) fn rolling<F>(values: &[f64], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = undefined(values.len());
    if window == 0 || values.len() < window {
        return out;
    }

    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().all(|v| v.is_finite()) {
            out[end - 1] = f(slice);
        }
    }
    out
}

/// Same as [`rolling`] over a series with undefined points.
pub(crate) fn rolling_opt<F>(values: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = undefined(values.len());
    if window == 0 || values.len() < window {
        return out;
    }

    let mut buf = Vec::with_capacity(window);
    for end in window..=values.len() {
        buf.clear();
        buf.extend(values[end - window..end].iter().filter_map(|v| v.filter(|x| x.is_finite())));
        if buf.len() == window {
            out[end - 1] = f(&buf);
        }
    }
    out
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub(crate) fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
