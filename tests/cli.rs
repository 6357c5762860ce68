use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WIDTH: usize = 27;

/// One CSV line with `cells` placed at their 1-indexed columns.
fn line(cells: &[(usize, &str)]) -> String {
    let mut fields = vec![String::new(); WIDTH];
    for (pos, text) in cells {
        fields[pos - 1] = if text.contains(',') {
            format!("\"{text}\"")
        } else {
            text.to_string()
        };
    }
    fields.join(",")
}

fn report(batch_677_total: &str) -> String {
    report_with(27, batch_677_total, "70.00")
}

/// The sample report with receipt amounts in column `amount`.
fn report_with(amount: usize, batch_677_total: &str, grand_total: &str) -> String {
    [
        line(&[(2, "Batch: 677"), (11, "Date Processed: 11-16-2024")]),
        line(&[(3, "8765"), (7, "11-16-2024"), (11, "Cash Participants")]),
        line(&[(3, "cash"), (11, "General"), (16, "PancakeBreakfast"), (20, "bli=28"), (amount, "35.00")]),
        line(&[(3, "8766"), (7, "11-16-2024"), (11, "John Smith")]),
        line(&[(3, "1251"), (11, "General"), (amount, "20.00")]),
        line(&[(11, "Charity"), (20, "bli=none fund=youth"), (amount, "15.00")]),
        line(&[(18, "Batch 677 Total:"), (24, batch_677_total)]),
        line(&[(4, "Page 1 of 1")]),
        line(&[(17, "Grand Total of Report of Receipts:"), (23, grand_total)]),
    ]
    .join("\n")
        + "\n"
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The binary with HOME pointed at the workspace so no user settings leak in.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("receiptflat").unwrap();
        cmd.env("HOME", self.path()).env("NO_COLOR", "1");
        cmd
    }
}

#[test]
fn test_convert_writes_csv_beside_input() {
    let ws = Workspace::new();
    let input = ws.write("receipts.csv", &report("70.00"));

    ws.cmd()
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 records"))
        .stdout(predicate::str::contains("All totals reconciled."));

    let out = std::fs::read_to_string(ws.path().join("receipts-receipts.csv")).unwrap();
    let mut lines = out.lines();
    assert_eq!(
        lines.next().unwrap(),
        "ProcessDate,VRDate,Batch,VRNumber,Transfer,Amount,PayorPayee,Account,Event,\
         Description,BudgetLine,Split,CheckNumber,fund"
    );
    assert_eq!(
        lines.next().unwrap(),
        "11-16-2024,11-16-2024,677,8765,false,35.00,Cash Participants,General,\
         PancakeBreakfast,bli=28,28,false,cash,"
    );
    assert_eq!(
        lines.next().unwrap(),
        "11-16-2024,11-16-2024,677,8766,false,20.00,John Smith,General,,,,true,1251,"
    );
    assert_eq!(
        lines.next().unwrap(),
        "11-16-2024,11-16-2024,677,8766,false,15.00,John Smith,Charity,,\
         bli=none fund=youth,none,true,1251,youth"
    );
    assert!(lines.next().is_none());
}

#[test]
fn test_convert_json_to_stdout() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("70.00"));

    ws.cmd()
        .args(["convert", "--format", "json", "-o", "-"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["))
        .stdout(predicate::str::contains("\"receiptNumber\": \"8766\""))
        .stdout(predicate::str::contains("\"budgetLine\": 28"))
        .stderr(predicate::str::contains("All totals reconciled."));
}

#[test]
fn test_check_fails_on_batch_mismatch() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("71.00"));
    let output = ws.path().join("out.csv");

    ws.cmd()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("batch 677"));

    ws.cmd()
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure();
    assert!(!output.exists());
}

#[test]
fn test_grand_total_mismatch_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report_with(27, "70.00", "71.00"));
    let output = ws.path().join("out.csv");

    ws.cmd()
        .arg("convert")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Input report grand total does not match total of receipts scanned",
        ))
        .stdout(predicate::str::contains("Wrote").not());
    assert!(!output.exists());
    assert!(!ws.path().join("r-receipts.csv").exists());
}

#[test]
fn test_rows_after_blank_lines_keep_their_line_numbers() {
    let ws = Workspace::new();
    let mut content = report("70.00");
    content.insert(0, '\n');
    let input = ws.write("r.csv", &content);

    ws.cmd()
        .args(["field", "--row", "2", "--field", "BatchNum"])
        .arg(&input)
        .assert()
        .success()
        .stdout("677\n");
    ws.cmd()
        .args(["check", "--strict"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 9 matches no known row layout"));
}

#[test]
fn test_strict_rejects_unclassified_rows() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("70.00"));

    ws.cmd().arg("check").arg(&input).assert().success();
    ws.cmd()
        .args(["check", "--strict"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 8 matches no known row layout"));
}

#[test]
fn test_classify_lists_row_kinds() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("70.00"));

    ws.cmd()
        .arg("classify")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("batch 677 processed 11-16-2024"))
        .stdout(predicate::str::contains("receipt 8766 11-16-2024 John Smith"))
        .stdout(predicate::str::contains("Page 1 of 1"));
}

#[test]
fn test_field_extracts_one_value() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("70.00"));

    ws.cmd()
        .args(["field", "--row", "1", "--field", "BatchNum"])
        .arg(&input)
        .assert()
        .success()
        .stdout("677\n");

    ws.cmd()
        .args(["field", "--row", "2", "--field", "BatchTotal"])
        .arg(&input)
        .assert()
        .success()
        .stdout("(absent)\n");

    ws.cmd()
        .args(["field", "--row", "2", "--field", "BatchTotal", "--required"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BatchTotal not found, row 2"));
}

#[test]
fn test_field_rejects_unknown_name() {
    let ws = Workspace::new();
    let input = ws.write("r.csv", &report("70.00"));

    ws.cmd()
        .args(["field", "--row", "1", "--field", "Colour"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field name: 'Colour'"));
}

#[test]
fn test_config_init_then_show() {
    let ws = Workspace::new();
    let path = ws.path().join("settings.json");

    ws.cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    ws.cmd()
        .args(["config", "init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ws.cmd()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"amount\": 27"))
        .stdout(predicate::str::contains("\"transfer_payor\": \"internal transfer in\""));
}

#[test]
fn test_custom_layout_from_settings() {
    let ws = Workspace::new();
    let settings = ws.write("s.json", r#"{ "columns": { "amount": 26 } }"#);
    let input = ws.write("r.csv", &report_with(26, "70.00", "70.00"));

    ws.cmd()
        .args(["check", "--config"])
        .arg(&settings)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records from 2 receipts"))
        .stdout(predicate::str::contains("All totals reconciled."));

    // Under the default layout column 26 is not the amount, so the check
    // number row reads as a receipt start without a date.
    ws.cmd()
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ReceiptDate not found, row 5"));
}
