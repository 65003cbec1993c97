use object_chain::{Chain, ChainElement, Link};

pub mod biquad;
pub mod median;

/// A per-sample filter stage. All stages in this crate are total: they
/// produce an output for every input, from the first sample on.
pub trait Filter {
    fn update(&mut self, sample: f32) -> f32;
    fn clear(&mut self);
}

impl<F> Filter for Chain<F>
where
    F: Filter,
{
    fn update(&mut self, sample: f32) -> f32 {
        self.object.update(sample)
    }

    fn clear(&mut self) {
        self.object.clear();
    }
}

impl<F, P> Filter for Link<F, P>
where
    F: Filter,
    P: ChainElement + Filter,
{
    fn update(&mut self, sample: f32) -> f32 {
        let sample = self.parent.update(sample);
        self.object.update(sample)
    }

    fn clear(&mut self) {
        self.parent.clear();
        self.object.clear();
    }
}
