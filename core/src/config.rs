use bon::Builder;
use std::fmt;

use crate::{
    error::{Error, Result},
    Filter,
};

#[derive(Debug, Clone, Builder)]
pub struct PipelineOptions {
    /// Quantizer sampling interval, 1-30. Lower is slower and higher quality.
    #[builder(default = 10)]
    pub quality: u8,

    #[builder(default = num_cpus::get())]
    pub num_threads: usize,

    #[builder(default)]
    pub filter: Filter,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Display for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PipelineOptions {{ quality: {}, num_threads: {}, filter: {:?} }}",
            self.quality, self.num_threads, self.filter,
        )
    }
}

impl PipelineOptions {
    const MAX_QUALITY: u8 = 30;

    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > Self::MAX_QUALITY {
            return Err(Error::InvalidQuality {
                value: self.quality,
                max: Self::MAX_QUALITY,
            });
        }

        if self.num_threads > num_cpus::get() {
            return Err(Error::InvalidThreadCount(num_cpus::get()));
        }

        Ok(())
    }

    pub fn validated(options: Self) -> Result<Self> {
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = PipelineOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.quality, 10);
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let options = PipelineOptions::builder().quality(31).build();
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidQuality { value: 31, .. })
        ));
        let options = PipelineOptions::builder().quality(0).build();
        assert!(options.validate().is_err());
    }
}
