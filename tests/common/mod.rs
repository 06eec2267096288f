// Shared fixtures for wavebench integration tests
#![allow(dead_code)]

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wavebench::config::{ParallelConfig, PipelineSettings};
use wavebench::executor::CancelToken;
use wavebench::progress::ProgressManager;
use wavebench::{ClassifiedModule, ModuleDir, ModuleRecord, Outcome, PipelineController, Port, Toolchain};

static MODULE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"module\s+(\w+)\s*\(([^)]*)\)").unwrap());

/// Per-adapter invocation counters.
#[derive(Debug, Default)]
pub struct Calls {
    pub classify: AtomicUsize,
    pub testbench: AtomicUsize,
    pub compile: AtomicUsize,
    pub run: AtomicUsize,
    pub extract: AtomicUsize,
    pub render: AtomicUsize,
    /// Testbench generations running right now, and the most ever seen
    pub testbench_in_flight: AtomicUsize,
    pub testbench_peak: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Adapter calls made after ingestion
    pub fn stage_total(&self) -> usize {
        [
            &self.testbench,
            &self.compile,
            &self.run,
            &self.extract,
            &self.render,
        ]
        .iter()
        .map(|c| Calls::get(c))
        .sum()
    }
}

/// A toolchain that never spawns a process.
///
/// The classifier reads ANSI-style headers (`module m(input a, output y)`);
/// every other step writes its marker file unless the module is listed in
/// one of the failure sets.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    pub calls: Calls,
    /// Modules whose testbench generator exits cleanly without `tb.v`
    pub testbench_without_output: HashSet<String>,
    /// Modules whose testbench generator exits non-zero
    pub testbench_errors: HashSet<String>,
    /// Modules whose compile exits non-zero
    pub compile_errors: HashSet<String>,
    /// Time each testbench generation takes
    pub testbench_delay: Duration,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_compile(modules: &[&str]) -> Self {
        Self {
            compile_errors: modules.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_testbench(modules: &[&str]) -> Self {
        Self {
            testbench_without_output: modules.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn crashing_testbench(modules: &[&str]) -> Self {
        Self {
            testbench_errors: modules.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn slow_testbench(delay: Duration) -> Self {
        Self {
            testbench_delay: delay,
            ..Self::default()
        }
    }
}

fn module_name(dir: &ModuleDir) -> String {
    wavebench::record::load(dir)
        .map(|r| r.module_name)
        .unwrap_or_default()
}

impl Toolchain for FakeToolchain {
    fn classify(&self, source: &str) -> wavebench::Result<Option<ClassifiedModule>> {
        self.calls.classify.fetch_add(1, Ordering::SeqCst);
        let Some(caps) = MODULE_HEADER.captures(source) else {
            return Ok(None);
        };

        let ports = caps[2]
            .split(',')
            .filter_map(|decl| {
                let mut words = decl.split_whitespace();
                match (words.next(), words.last()) {
                    (Some("input"), Some(name)) => Some(Port::input(name)),
                    (Some("output"), Some(name)) => Some(Port::output(name)),
                    _ => None,
                }
            })
            .collect();

        Ok(Some(ClassifiedModule {
            name: caps[1].to_string(),
            parameters: vec![],
            ports,
        }))
    }

    fn generate_testbench(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome {
        self.calls.testbench.fetch_add(1, Ordering::SeqCst);
        let running = self.calls.testbench_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.testbench_peak.fetch_max(running, Ordering::SeqCst);
        thread::sleep(self.testbench_delay);
        self.calls.testbench_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.testbench_errors.contains(&record.module_name) {
            return Outcome::retryable("exited with status 1");
        }
        if self.testbench_without_output.contains(&record.module_name) {
            return Outcome::terminal("exited cleanly but produced no tb.v");
        }
        let tb = format!(
            "`timescale 1ns/1ns\nmodule testbench;\n{} dut();\ninitial begin\n$dumpfile(\"dump.vcd\");\n$dumpvars(0, testbench);\nend\nendmodule\n",
            record.module_name
        );
        fs::write(dir.testbench_file(), tb).unwrap();
        Outcome::Success
    }

    fn compile(&self, dir: &ModuleDir) -> Outcome {
        self.calls.compile.fetch_add(1, Ordering::SeqCst);
        if self.compile_errors.contains(&module_name(dir)) {
            return Outcome::retryable("exited with status 1");
        }
        fs::write(dir.compiled_file(), "#! vvp").unwrap();
        Outcome::Success
    }

    fn run_simulation(&self, dir: &ModuleDir) -> Outcome {
        self.calls.run.fetch_add(1, Ordering::SeqCst);
        fs::write(dir.dump_file(), "$enddefinitions $end").unwrap();
        Outcome::Success
    }

    fn extract_trace(&self, dir: &ModuleDir, record: &ModuleRecord) -> Outcome {
        self.calls.extract.fetch_add(1, Ordering::SeqCst);
        let lanes: Vec<Value> = record
            .ports
            .iter()
            .map(|port| {
                let wave = if record.is_clock(&port.name) { "p......." } else { "01.0" };
                json!({"name": format!("testbench.dut.{}", port.name), "wave": wave})
            })
            .collect();
        fs::write(dir.raw_trace_file(), json!({ "signal": lanes }).to_string()).unwrap();
        Outcome::Success
    }

    fn render(&self, _dir: &ModuleDir, descriptor: &Path, image: &Path) -> Outcome {
        self.calls.render.fetch_add(1, Ordering::SeqCst);
        assert!(descriptor.is_file(), "descriptor {} missing", descriptor.display());
        fs::write(image, b"\x89PNG").unwrap();
        Outcome::Success
    }
}

pub fn settings(root: &Path) -> PipelineSettings {
    PipelineSettings {
        root: Some(root.to_path_buf()),
        ..PipelineSettings::default()
    }
}

pub fn controller(settings: PipelineSettings, toolchain: Arc<FakeToolchain>) -> PipelineController {
    PipelineController::new(
        settings,
        toolchain,
        &ParallelConfig::with_jobs(4),
        CancelToken::new(),
        ProgressManager::hidden(),
    )
    .unwrap()
}
