//! Per-type renderers for reconciled components.

use std::collections::HashMap;

use a2ui_core::{Component, DataBag};

use crate::UiState;

type Renderer<V> = Box<dyn Fn(&DataBag, Option<&DataBag>) -> V + Send + Sync>;

/// Maps a component type to the function that draws it.
///
/// `V` is whatever the host renders into (widgets, strings, markup).
pub struct RenderRegistry<V> {
    renderers: HashMap<String, Renderer<V>>,
}

impl<V> Default for RenderRegistry<V> {
    fn default() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }
}

impl<V> RenderRegistry<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the renderer for `component_type`, replacing any earlier one.
    pub fn register<F>(&mut self, component_type: impl Into<String>, renderer: F)
    where
        F: Fn(&DataBag, Option<&DataBag>) -> V + Send + Sync + 'static,
    {
        self.renderers
            .insert(component_type.into(), Box::new(renderer));
    }

    /// Builder form of [`RenderRegistry::register`].
    #[must_use]
    pub fn with<F>(mut self, component_type: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&DataBag, Option<&DataBag>) -> V + Send + Sync + 'static,
    {
        self.register(component_type, renderer);
        self
    }

    #[must_use]
    pub fn handles(&self, component_type: &str) -> bool {
        self.renderers.contains_key(component_type)
    }

    /// Render one component, `None` if its type has no renderer.
    pub fn render(&self, component: &Component) -> Option<V> {
        let renderer = self.renderers.get(&component.component_type)?;
        Some(renderer(&component.data, component.metadata.as_ref()))
    }

    /// Render every component of `state` in id order.
    ///
    /// Components with an unregistered type are skipped.
    pub fn render_snapshot(&self, state: &UiState) -> Vec<V> {
        state
            .components_by_id()
            .into_iter()
            .filter_map(|component| {
                let rendered = self.render(component);
                if rendered.is_none() {
                    tracing::debug!(
                        component_id = %component.id,
                        component_type = %component.component_type,
                        "No renderer registered"
                    );
                }
                rendered
            })
            .collect()
    }
}
