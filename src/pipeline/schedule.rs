//! Sequencing of render units across bounces and samples.

/// One batch of GPU work; the next unit is scheduled when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderUnit {
    /// Camera (bounce 0 only), primary intersection, material resolve,
    /// shadow intersection, direct light and path trace for one bounce
    Bounce { sample: u32, bounce: u32 },
    /// Blend the finished sample into the final image
    Accumulate { sample: u32 },
}

impl RenderUnit {
    pub fn first(sample: u32) -> Self {
        RenderUnit::Bounce { sample, bounce: 0 }
    }

    pub fn sample(self) -> u32 {
        match self {
            RenderUnit::Bounce { sample, .. } | RenderUnit::Accumulate { sample } => sample,
        }
    }

    /// Unit following this one within the same sample, or the next sample's first.
    pub fn next(self, max_depth: u32) -> Self {
        match self {
            RenderUnit::Bounce { sample, bounce } if bounce + 1 < max_depth => {
                RenderUnit::Bounce { sample, bounce: bounce + 1 }
            }
            RenderUnit::Bounce { sample, .. } => RenderUnit::Accumulate { sample },
            RenderUnit::Accumulate { sample } => RenderUnit::first(sample + 1),
        }
    }
}
