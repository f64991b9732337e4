//! Rule-based advice.
//!
//! All advisors are pure functions of their inputs. Their temperature
//! thresholds are deliberately independent: `spray` answers whether a
//! treatment class works at all at the current temperature, `severity` whether
//! beetles are active enough for treatment to be urgent.

pub mod severity;
pub mod spray;
pub mod treatment;

pub use severity::{advise_severity, SeverityTier};
pub use spray::{advise_spray_timing, SprayAdvice};
pub use treatment::advise_treatment;
