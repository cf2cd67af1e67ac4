use crate::plan::SamplingPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointProgress {
    pub number: u32,
    pub observed: bool,
    pub sample_taken: bool,
}

/// Per-point completion for a plan, in route order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub points: Vec<PointProgress>,
    /// First point in route order that still lacks an observation.
    pub current: Option<u32>,
}

impl Progress {
    pub fn compute<O, S>(plan: &SamplingPlan, observed: O, sample_taken: S) -> Self
    where
        O: Fn(u32) -> bool,
        S: Fn(u32) -> bool,
    {
        let points: Vec<PointProgress> = plan
            .points
            .iter()
            .map(|point| PointProgress {
                number: point.number,
                observed: observed(point.number),
                sample_taken: sample_taken(point.number),
            })
            .collect();
        let current = points
            .iter()
            .find(|point| !point.observed)
            .map(|point| point.number);
        Self { points, current }
    }

    pub fn observed_count(&self) -> usize {
        self.points.iter().filter(|point| point.observed).count()
    }

    pub fn sampled_count(&self) -> usize {
        self.points.iter().filter(|point| point.sample_taken).count()
    }

    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }
}
