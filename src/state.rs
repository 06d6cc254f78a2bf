use std::sync::Arc;

use axum::extract::FromRef;

use crate::{annotator::Annotator, config::Config, store::Store};

pub type DynStore = Arc<dyn Store>;
pub type DynAnnotator = Arc<dyn Annotator>;

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub annotator: DynAnnotator,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
