//! End-to-end tests for the detection pipeline: window filling, scoring,
//! alert dispatch, and model resolution.

mod alerting;
mod helpers;
mod model_resolution;
mod scenarios;
