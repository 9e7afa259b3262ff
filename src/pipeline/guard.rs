//! Scoped acquisition of a model.
//!
//! The model is the one shared mutable resource of a run. [`ModelGuard`]
//! brackets executor iteration between the model's setup and teardown:
//! teardown runs on every exit path, including early returns from decode or
//! inference errors. A teardown failure on the drop path is logged rather
//! than raised; the success path surfaces it through
//! [`ModelGuard::finish`].

use crate::core::errors::PipelineResult;
use crate::core::traits::Model;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A drop guard that pairs [`Model::setup`] with [`Model::teardown`].
pub struct ModelGuard<'a, M: Model + ?Sized> {
    model: Option<&'a mut M>,
}

impl<'a, M: Model + ?Sized> ModelGuard<'a, M> {
    /// Runs the model's setup and arms the guard.
    ///
    /// # Arguments
    ///
    /// * `model` - The model to acquire for the duration of a run.
    ///
    /// # Returns
    ///
    /// An armed guard, or the setup error.
    pub fn new(model: &'a mut M) -> PipelineResult<Self> {
        model.setup()?;
        Ok(Self { model: Some(model) })
    }

    /// Runs teardown and disarms the guard, surfacing any teardown error.
    pub fn finish(mut self) -> PipelineResult<()> {
        if let Some(model) = self.model.take() {
            model.teardown()?;
        }
        Ok(())
    }
}

impl<M: Model + ?Sized> Deref for ModelGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &Self::Target {
        self.model.as_deref().expect("model accessed after finish")
    }
}

impl<M: Model + ?Sized> DerefMut for ModelGuard<'_, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.model
            .as_deref_mut()
            .expect("model accessed after finish")
    }
}

impl<M: Model + ?Sized> Drop for ModelGuard<'_, M> {
    fn drop(&mut self) {
        if let Some(model) = self.model.take() {
            if let Err(err) = model.teardown() {
                warn!("model teardown failed: {err}");
            }
        }
    }
}
