//! Cross-module ECS scenarios

mod motion;
