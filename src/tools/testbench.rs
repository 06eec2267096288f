//! Testbench generation and trace-dump trailer injection.
//!
//! The generator emits a testbench without a timescale and without any
//! instruction to dump a trace. Both are added here so the simulation
//! produces `dump.vcd` with nanosecond timing.

use std::fs;
use std::time::Duration;

use super::process::{remove_partial, Diagnostics, ToolCommand};
use super::{expect_output, Outcome};
use crate::layout::{ModuleDir, DUMP_FILE};
use crate::record::{write_atomic, ModuleRecord};

pub const TIMESCALE: &str = "`timescale 1ns/1ns";

const DUMP_MARKER: &str = "$dumpfile";

/// Parameters of the generator invocation shared by every module.
#[derive(Debug, Clone)]
pub struct TestbenchRequest<'a> {
    pub program: &'a str,
    pub timeout: Duration,
    pub max_sim_time: u64,
}

/// Build the generator command for one module.
pub fn command(request: &TestbenchRequest<'_>, dir: &ModuleDir, record: &ModuleRecord) -> ToolCommand {
    let mut cmd = ToolCommand::new(request.program, request.timeout)
        .arg("-in")
        .path_arg(&dir.source_file())
        .arg("-top")
        .arg(record.module_name.as_str())
        .arg("-out")
        .path_arg(&dir.testbench_file())
        .produces(&dir.testbench_file())
        .arg("-max_sim_time")
        .arg(request.max_sim_time.to_string());
    for clock in &record.clocks {
        cmd = cmd.arg("-clk").arg(clock.as_str());
    }
    for reset in &record.resets {
        cmd = cmd.arg("-rst").arg(reset.as_str());
    }
    cmd
}

/// Run the generator and finish the testbench with the trailer.
pub fn generate(
    request: &TestbenchRequest<'_>,
    dir: &ModuleDir,
    record: &ModuleRecord,
    diagnostics: Diagnostics,
) -> Outcome {
    let cmd = command(request, dir, record).diagnostics(diagnostics.clone());
    if let Err(e) = cmd.run() {
        return e.into();
    }

    let outcome = expect_output(&dir.testbench_file(), &diagnostics);
    if !outcome.is_success() {
        return outcome;
    }

    match finish_testbench(dir) {
        Ok(()) => Outcome::Success,
        Err(reason) => {
            diagnostics.record_failure(&reason);
            // A testbench without the trailer must not stay behind as a marker
            remove_partial(&dir.testbench_file());
            Outcome::TerminalFailure(reason)
        }
    }
}

fn finish_testbench(dir: &ModuleDir) -> Result<(), String> {
    let path = dir.testbench_file();
    let text = fs::read_to_string(&path).map_err(|e| format!("cannot read testbench: {e}"))?;
    let finished = inject_trailer(&text).ok_or_else(|| "testbench has no endmodule".to_string())?;
    if finished != text {
        write_atomic(&path, finished.as_bytes()).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// True when the testbench already dumps a trace.
pub fn has_trailer(text: &str) -> bool {
    text.contains(DUMP_MARKER)
}

/// Prepend the timescale and insert the dump block before the final
/// `endmodule`.
///
/// Text that already carries the trailer is returned unchanged. `None` when
/// there is no `endmodule` to anchor the dump block.
pub fn inject_trailer(text: &str) -> Option<String> {
    if has_trailer(text) {
        return Some(text.to_string());
    }

    let end = text.rfind("endmodule")?;
    let dump_block = format!(
        "initial begin\n$dumpfile(\"{DUMP_FILE}\");\n$dumpvars(0, testbench);\nend\n"
    );

    let mut out = String::with_capacity(text.len() + TIMESCALE.len() + dump_block.len() + 1);
    out.push_str(TIMESCALE);
    out.push('\n');
    out.push_str(&text[..end]);
    out.push_str(&dump_block);
    out.push_str(&text[end..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Port;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inject_trailer() {
        let tb = indoc! {"
            module testbench;
            reg clk;
            endmodule
        "};
        let expected = indoc! {r#"
            `timescale 1ns/1ns
            module testbench;
            reg clk;
            initial begin
            $dumpfile("dump.vcd");
            $dumpvars(0, testbench);
            end
            endmodule
        "#};
        assert_eq!(inject_trailer(tb).unwrap(), expected);
    }

    #[test]
    fn test_inject_trailer_is_idempotent() {
        let once = inject_trailer("module testbench;\nendmodule\n").unwrap();
        let twice = inject_trailer(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches("$dumpfile").count(), 1);
        assert_eq!(twice.matches(TIMESCALE).count(), 1);
    }

    #[test]
    fn test_inject_trailer_anchors_on_last_endmodule() {
        let tb = "module helper;\nendmodule\nmodule testbench;\nendmodule\n";
        let out = inject_trailer(tb).unwrap();
        let dump = out.find("$dumpfile").unwrap();
        assert!(dump > out.find("module testbench").unwrap());
    }

    #[test]
    fn test_inject_trailer_without_endmodule() {
        assert_eq!(inject_trailer("module testbench;"), None);
    }

    #[test]
    fn test_command_arguments() {
        let record = ModuleRecord {
            module_name: "counter".to_string(),
            clocks: vec!["clk".to_string()],
            resets: vec!["rst".to_string()],
            ports: vec![Port::input("clk"), Port::input("rst"), Port::output("q")],
            ..Default::default()
        };
        let request = TestbenchRequest {
            program: "gentbvlog",
            timeout: Duration::from_secs(60),
            max_sim_time: 100,
        };
        let dir = ModuleDir::new("/data/ds_0");
        let cmd = command(&request, &dir, &record);

        assert_eq!(cmd.program(), "gentbvlog");
        assert_eq!(
            cmd.arguments(),
            &[
                "-in",
                "/data/ds_0/module.v",
                "-top",
                "counter",
                "-out",
                "/data/ds_0/tb.v",
                "-max_sim_time",
                "100",
                "-clk",
                "clk",
                "-rst",
                "rst",
            ]
        );
    }

    #[cfg(unix)]
    mod failures {
        use super::*;
        use crate::pipeline::{ModuleState, PipelineStage};
        use crate::record;
        use crate::tools::process::write_script;
        use tempfile::TempDir;
        use pretty_assertions::assert_eq;

        fn classified(temp: &TempDir) -> (ModuleDir, ModuleRecord) {
            let dir = ModuleDir::new(temp.path().join("ds_0"));
            fs::create_dir(dir.path()).unwrap();
            fs::write(dir.source_file(), "module m(input a, output y);\nendmodule\n").unwrap();
            let record = ModuleRecord {
                module_name: "m".to_string(),
                ports: vec![Port::input("a"), Port::output("y")],
                ..Default::default()
            };
            record::save(&record, &dir).unwrap();
            (dir, record)
        }

        fn request(program: &str) -> TestbenchRequest<'_> {
            TestbenchRequest {
                program,
                timeout: Duration::from_secs(5),
                max_sim_time: 100,
            }
        }

        #[test]
        fn test_generator_exit_failure_leaves_no_testbench() {
            let temp = TempDir::new().unwrap();
            let (dir, record) = classified(&temp);
            // -out is the sixth argument
            let tool = write_script(
                temp.path(),
                "gentbvlog",
                "printf 'module testbench;\\nendmodule\\n' > \"$6\"\nexit 1",
            );
            let program = tool.to_string_lossy().into_owned();

            let outcome = generate(&request(&program), &dir, &record, Diagnostics::Discard);

            assert!(matches!(outcome, Outcome::RetryableFailure(_)));
            assert!(!dir.testbench_file().exists());
            assert_eq!(ModuleState::probe(&dir), ModuleState::Classified);
            assert!(ModuleState::probe(&dir).needs(PipelineStage::Synthesize, &dir));
        }

        #[test]
        fn test_testbench_without_endmodule_is_removed() {
            let temp = TempDir::new().unwrap();
            let (dir, record) = classified(&temp);
            let tool = write_script(temp.path(), "gentbvlog", "echo 'module testbench;' > \"$6\"");
            let program = tool.to_string_lossy().into_owned();

            let outcome = generate(&request(&program), &dir, &record, Diagnostics::Discard);

            assert!(outcome.should_discard());
            assert!(!dir.testbench_file().exists());
        }

        #[test]
        fn test_generated_testbench_gets_trailer() {
            let temp = TempDir::new().unwrap();
            let (dir, record) = classified(&temp);
            let tool = write_script(
                temp.path(),
                "gentbvlog",
                "printf 'module testbench;\\nendmodule\\n' > \"$6\"",
            );
            let program = tool.to_string_lossy().into_owned();

            let outcome = generate(&request(&program), &dir, &record, Diagnostics::Discard);

            assert!(outcome.is_success());
            let text = fs::read_to_string(dir.testbench_file()).unwrap();
            assert!(text.starts_with(TIMESCALE));
            assert!(has_trailer(&text));
            assert_eq!(ModuleState::probe(&dir), ModuleState::TestbenchReady);
        }
    }
}
