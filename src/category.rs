//! Category aggregation: per-marker means → [items, C, L] stacks.
//!
//! Stack index `i` holds the mean epoch of code `first_code + i` and
//! corresponds to `labels[i]`.
use log::debug;
use ndarray::{stack, ArrayView2, Array3, Axis};

use crate::average::MarkerMeans;
use crate::config::Category;
use crate::error::{AnalysisError, Result};

/// Mean epochs of one category, item-major.
#[derive(Debug, Clone)]
pub struct CategoryStack {
    pub name: String,
    pub labels: Vec<String>,
    /// [items, C, L]
    pub data: Array3<f32>,
}

impl CategoryStack {
    pub fn n_items(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn n_channels(&self) -> usize {
        self.data.shape()[1]
    }
}

/// Stack the mean epochs of `category`'s codes in code order.
///
/// Fails with [`AnalysisError::MissingMarker`] on the first code that has
/// no mean epoch.
pub fn stack_category(means: &MarkerMeans, category: &Category) -> Result<CategoryStack> {
    let views = category
        .codes()
        .zip(&category.labels)
        .map(|(code, label)| {
            means.get(&code).map(|m| m.view()).ok_or_else(|| AnalysisError::MissingMarker {
                category: category.name.clone(),
                code,
                label: label.clone(),
            })
        })
        .collect::<Result<Vec<ArrayView2<f32>>>>()?;

    if views.is_empty() {
        return Err(AnalysisError::EmptyStack { category: category.name.clone() });
    }
    let data = stack(Axis(0), &views).map_err(|e| {
        AnalysisError::MalformedRecording(format!("category {:?}: {e}", category.name))
    })?;
    debug!("category {:?}: stack {:?}", category.name, data.dim());

    Ok(CategoryStack {
        name: category.name.clone(),
        labels: category.labels.clone(),
        data,
    })
}

/// [`stack_category`] for each category, in order.
pub fn stack_categories(means: &MarkerMeans, categories: &[Category]) -> Result<Vec<CategoryStack>> {
    categories.iter().map(|c| stack_category(means, c)).collect()
}
