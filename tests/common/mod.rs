// tests/common/mod.rs

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pipedag::model::Pipeline;
use pipedag_test_utils::builders::{PipelineBuilder, StepBuilder, write_file};

pub use pipedag_test_utils::{init_tracing, with_timeout};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Paths used by [`split_merge`].
pub struct SplitMergeFiles {
    pub a: PathBuf,
    pub b: PathBuf,
    pub c: PathBuf,
    pub d: PathBuf,
}

/// step 1: a -> b, step 2: a -> c, step 3: b + c -> d.
///
/// `a` is created in `dir` with contents `abc`; the rest are not.
pub fn split_merge(dir: &Path) -> (Pipeline, SplitMergeFiles) {
    let files = SplitMergeFiles {
        a: write_file(dir, "a.txt", "abc"),
        b: dir.join("b.txt"),
        c: dir.join("c.txt"),
        d: dir.join("d.txt"),
    };

    let pipeline = PipelineBuilder::new("split merge")
        .resource("a", &files.a)
        .resource("b", &files.b)
        .resource("c", &files.c)
        .resource("d", &files.d)
        .step(
            StepBuilder::new("step 1", "cp {{ a }} {{ b }}")
                .input("a")
                .output("b")
                .build(),
        )
        .step(
            StepBuilder::new("step 2", "cp {{ a }} {{ c }}")
                .input("a")
                .output("c")
                .build(),
        )
        .step(
            StepBuilder::new("step 3", "cat {{ b }} {{ c }} > {{ d }}")
                .input("b")
                .input("c")
                .output("d")
                .build(),
        )
        .build();

    (pipeline, files)
}
