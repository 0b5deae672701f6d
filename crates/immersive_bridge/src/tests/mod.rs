//! Cross-module behavior tests driving the bridge through a recording engine

mod support;

mod lifecycle;
