//! Homepage routes: the feature section as HTML and as JSON.

use axum::Json;
use axum::response::Html;

use crate::features::{FEATURE_LIST, FeatureBlock, render_features, render_homepage};

pub async fn homepage() -> Html<String> {
    Html(render_homepage(&FEATURE_LIST))
}

pub async fn features() -> Json<Vec<FeatureBlock>> {
    Json(render_features(&FEATURE_LIST))
}
