use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradetrackd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradetrackd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn roster_and_scale_survive_a_restart() {
    let workspace = temp_dir("gradetrack-reopen");

    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "classes.create",
            json!({ "name": "Math", "type": "point-based" }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "classes.update",
            json!({ "patch": { "data": [{ "score": 96, "total": 100 }] } }),
        );
        // Loosen the A+ band below the current standing.
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "gradeScale.update",
            json!({ "grade": "A+", "minPercentage": 95 }),
        );
        let _ = child.kill();
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(res.get("classCount").and_then(|v| v.as_u64()), Some(1));

    let scale = request_ok(&mut stdin, &mut reader, "6", "gradeScale.get", json!({}));
    assert_eq!(
        scale.pointer("/gradeScale/A+").and_then(|v| v.as_f64()),
        Some(95.0)
    );

    // The reloaded scale drives letter lookups.
    let sum = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "calc.classSummary",
        json!({}),
    );
    assert_eq!(sum.get("percent").and_then(|v| v.as_f64()), Some(96.0));
    assert_eq!(sum.get("letter").and_then(|v| v.as_str()), Some("A+"));

    let _ = child.kill();
}

#[test]
fn scale_reset_restores_the_standard_bands() {
    let workspace = temp_dir("gradetrack-scale-reset");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "gradeScale.update",
        json!({ "grade": "A+", "minPercentage": 50 }),
    );
    let res = request_ok(&mut stdin, &mut reader, "3", "gradeScale.reset", json!({}));
    assert_eq!(
        res.pointer("/gradeScale/A+").and_then(|v| v.as_f64()),
        Some(97.0)
    );
    assert_eq!(
        res.pointer("/gradeScale/F").and_then(|v| v.as_f64()),
        Some(0.0)
    );

    let _ = child.kill();
}
