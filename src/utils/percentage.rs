use std::{ops::Deref, str::FromStr};

use anyhow::anyhow;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value.is_nan() || value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Caps the value, the way a 0..=100 slider would.
    pub fn clamp_to(self, max: f64) -> Percentage {
        Percentage(self.0.min(max))
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let s = s.trim().trim_end_matches("%");
        let v = s.parse::<f64>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` taken by `part`, in percent. A non-positive whole has no shares.
pub fn share_percentage(part: f64, whole: f64) -> f64 {
    if whole > 0. {
        part / whole * 100.
    } else {
        0.
    }
}

/// Inverse of [share_percentage].
pub fn portion_of(percentage: f64, whole: f64) -> f64 {
    percentage / 100. * whole
}
