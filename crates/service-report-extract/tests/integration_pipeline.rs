mod common;

use std::process::Command;

use service_report_extract::{
    BatchOptions, CsvOptions, PdfSource, ReportSource, Vendor, extract_folder_to_csv,
};
use tempfile::tempdir;

#[test]
fn reads_text_placed_by_coordinates() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("report.pdf");
    common::create_enercon_report(&input, "820001", "4711").expect("PDF fixture should be created");

    let source = PdfSource::new(&input);
    assert_eq!(source.page_count().expect("page count"), 3);
    let first_page = source.page_text(1).expect("page 1 text");
    assert_eq!(first_page.lines().next(), Some("REGULAR SERVICE ORDER"));
}

#[test]
fn extracts_enercon_report_to_csv_pair() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("in");
    std::fs::create_dir(&input).expect("input folder created");
    common::create_enercon_report(&input.join("report.pdf"), "820001", "4711")
        .expect("PDF fixture should be created");

    let metadata_dir = dir.path().join("metadata");
    let checklist_dir = dir.path().join("checklists");
    let summary = extract_folder_to_csv(
        Vendor::Enercon,
        &input,
        &metadata_dir,
        &checklist_dir,
        &BatchOptions::default(),
        &CsvOptions::default(),
    )
    .expect("folder should be processed");

    assert!(summary.all_succeeded(), "failures: {:?}", summary.failed);
    assert_eq!(summary.succeeded[0].stem, "820001_enercon_regular_service_order_4711");

    let metadata = std::fs::read_to_string(
        metadata_dir.join("metadata_820001_enercon_regular_service_order_4711.csv"),
    )
    .expect("metadata CSV should be readable");
    assert_eq!(
        metadata,
        ",Metadata\nType,E-82\nSerial number,820001\nOrder number,4711\n\
         Completion date,12.05.2023\nDefects,0\n"
    );

    let checklist = std::fs::read_to_string(
        checklist_dir.join("inspection_820001_enercon_regular_service_order_4711.csv"),
    )
    .expect("checklist CSV should be readable");
    assert_eq!(
        checklist,
        ",item_number,check_item,result\n0,1.1,Check tower flange,OK\n\
         1,1.2,\"Check blades\nfor cracks\",NOK\n"
    );
}

#[test]
fn extracts_vestas_report_with_categories_and_no_index() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("in");
    std::fs::create_dir(&input).expect("input folder created");
    common::create_vestas_report(&input.join("vestas.pdf")).expect("PDF fixture should be created");

    let out = dir.path().join("out");
    let csv_options = CsvOptions {
        include_index: false,
        ..CsvOptions::default()
    };
    let summary = extract_folder_to_csv(
        Vendor::Vestas,
        &input,
        &out,
        &out,
        &BatchOptions { categorize: true },
        &csv_options,
    )
    .expect("folder should be processed");

    assert!(summary.all_succeeded(), "failures: {:?}", summary.failed);
    let stem = "21187_vestas_5502311_annual_service";
    assert_eq!(summary.succeeded[0].stem, stem);

    let metadata = std::fs::read_to_string(out.join(format!("metadata_{stem}.csv")))
        .expect("metadata CSV should be readable");
    assert!(metadata.starts_with("field,Metadata\nturbine_number,21187\n"), "{metadata:?}");
    assert!(metadata.contains("pad_no,\n"), "{metadata:?}");
    assert!(metadata.contains("turbine_type,V112\n"), "{metadata:?}");
    assert!(metadata.contains("customer_address,Windpark Nord GmbH\n"), "{metadata:?}");

    let checklist = std::fs::read_to_string(out.join(format!("inspection_{stem}.csv")))
        .expect("checklist CSV should be readable");
    assert_eq!(
        checklist,
        "item_category,item_number_within_category,item_number,check_item,result\n\
         ,,10,Check nacelle cover bolts,OK\n\
         ,,11,Check hub,Done\n"
    );
}

#[test]
fn corrupt_report_is_skipped_and_names_stay_unique() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("in");
    std::fs::create_dir(&input).expect("input folder created");
    common::create_enercon_report(&input.join("a.pdf"), "820001", "4711")
        .expect("PDF fixture should be created");
    std::fs::write(input.join("b.pdf"), b"this is not a pdf").expect("corrupt file written");
    common::create_enercon_report(&input.join("c.pdf"), "820001", "4711")
        .expect("PDF fixture should be created");

    let out = dir.path().join("out");
    let summary = extract_folder_to_csv(
        Vendor::Enercon,
        &input,
        &out,
        &out,
        &BatchOptions::default(),
        &CsvOptions::default(),
    )
    .expect("folder should be processed");

    assert_eq!(summary.total(), 3);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].path.ends_with("b.pdf"));
    let stems = summary
        .succeeded
        .iter()
        .map(|success| success.stem.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        stems,
        vec![
            "820001_enercon_regular_service_order_4711",
            "820001_enercon_regular_service_order_4711_c",
        ]
    );
    assert!(out.join("inspection_820001_enercon_regular_service_order_4711_c.csv").exists());
}

#[test]
fn cli_exit_code_reflects_failures() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("in");
    std::fs::create_dir(&input).expect("input folder created");
    common::create_vestas_report(&input.join("good.pdf")).expect("PDF fixture should be created");
    std::fs::write(input.join("broken.pdf"), b"%PDF-1.5 truncated").expect("corrupt file written");
    let out = dir.path().join("out");

    let status = Command::new(env!("CARGO_BIN_EXE_report2csv"))
        .arg("extract")
        .args(["--vendor", "vestas"])
        .arg("--input")
        .arg(&input)
        .arg("--metadata-out")
        .arg(&out)
        .arg("--checklist-out")
        .arg(&out)
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(2));
    assert!(out.join("inspection_21187_vestas_5502311_annual_service.csv").exists());

    let status = Command::new(env!("CARGO_BIN_EXE_report2csv"))
        .arg("extract")
        .args(["--vendor", "vestas"])
        .arg("--input")
        .arg(dir.path().join("missing"))
        .arg("--metadata-out")
        .arg(&out)
        .arg("--checklist-out")
        .arg(&out)
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(1));
}

#[test]
fn cli_rejects_unknown_vendor() {
    let output = Command::new(env!("CARGO_BIN_EXE_report2csv"))
        .args(["extract", "--vendor", "siemens", "--input", "."])
        .args(["--metadata-out", ".", "--checklist-out", "."])
        .output()
        .expect("CLI should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("siemens"), "{stderr}");
}

#[test]
fn cli_region_prints_calibration_grid() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("report.pdf");
    common::create_enercon_report(&input, "820001", "4711").expect("PDF fixture should be created");

    let output = Command::new(env!("CARGO_BIN_EXE_report2csv"))
        .arg("region")
        .arg("--input")
        .arg(&input)
        .args(["--area", "20,700,600,620", "--columns", "125,290,390"])
        .args(["--pages", "2", "--split-text"])
        .output()
        .expect("CLI should run");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "Type,E-82,Serial number,820001\n"
    );
}
