//! Pipeline-level tests against in-process backend stubs.

mod support;
