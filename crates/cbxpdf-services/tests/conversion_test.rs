mod helpers;

use std::io::{Cursor, Read};

use cbxpdf_core::{AppError, BackgroundColor, ConversionJob, ConversionMode, Config, RenderSettings};
use helpers::fixtures::{self, BLUE, GREEN, RED};
use helpers::setup_services;
use uuid::Uuid;

#[tokio::test]
async fn test_selected_pages_convert_in_requested_order() {
    let services = setup_services(Config::for_tests());
    let handle = services.upload("issue-01.cbz", fixtures::three_page_cbz()).await;
    assert_eq!(handle.pages, vec!["a.jpg", "b.jpg", "c.jpg"]);

    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::with_pages(handle.id, vec![0, 2])],
        )
        .await
        .unwrap();

    assert!(!output.is_zip);
    assert_eq!(output.filename, "issue-01.pdf");
    assert_eq!(output.content_type(), "application/pdf");
    assert!(output.bytes.starts_with(b"%PDF-"));

    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 2);
    assert!(fixtures::close_to(colors[0], RED), "page 1 was {:?}", colors[0]);
    assert!(fixtures::close_to(colors[1], BLUE), "page 2 was {:?}", colors[1]);
}

#[tokio::test]
async fn test_explicit_order_and_duplicates_are_kept() {
    let services = setup_services(Config::for_tests());
    let handle = services.upload("dup.cbz", fixtures::three_page_cbz()).await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::with_pages(handle.id, vec![2, 0, 2])],
        )
        .await
        .unwrap();

    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 3);
    assert!(fixtures::close_to(colors[0], BLUE));
    assert!(fixtures::close_to(colors[1], RED));
    assert!(fixtures::close_to(colors[2], BLUE));
}

#[tokio::test]
async fn test_page_range_narrows_all_pages() {
    let services = setup_services(Config::for_tests());
    let handle = services.upload("range.cbz", fixtures::three_page_cbz()).await;

    let settings = RenderSettings::new(80, BackgroundColor::Black)
        .unwrap()
        .with_page_range(Some(2), Some(3));
    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            settings,
            vec![ConversionJob::all_pages(handle.id)],
        )
        .await
        .unwrap();

    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 2);
    assert!(fixtures::close_to(colors[0], GREEN));
    assert!(fixtures::close_to(colors[1], BLUE));
}

#[tokio::test]
async fn test_single_mode_uses_first_job_only() {
    let services = setup_services(Config::for_tests());
    let first = services.upload("first.cbz", fixtures::three_page_cbz()).await;
    let second = services.upload("second.cbz", fixtures::three_page_cbz()).await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![
                ConversionJob::with_pages(first.id, vec![1]),
                ConversionJob::all_pages(second.id),
            ],
        )
        .await
        .unwrap();

    assert_eq!(output.filename, "first.pdf");
    assert_eq!(fixtures::pdf_page_count(&output.bytes), 1);
}

#[tokio::test]
async fn test_combine_appends_jobs_in_order() {
    let services = setup_services(Config::for_tests());
    let a = services.upload("a.cbz", fixtures::three_page_cbz()).await;
    let b = services
        .upload(
            "b.cbz",
            fixtures::cbz(&[("only.png", fixtures::png(GREEN, 40, 40))]),
        )
        .await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Combine,
            RenderSettings::default(),
            vec![
                ConversionJob::with_pages(a.id, vec![0]),
                ConversionJob::all_pages(b.id),
                ConversionJob::with_pages(a.id, vec![2]),
            ],
        )
        .await
        .unwrap();

    assert!(!output.is_zip);
    assert_eq!(output.filename, "combined.pdf");
    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 3);
    assert!(fixtures::close_to(colors[0], RED));
    assert!(fixtures::close_to(colors[1], GREEN));
    assert!(fixtures::close_to(colors[2], BLUE));
}

#[tokio::test]
async fn test_combine_fails_fast_on_unknown_archive() {
    let services = setup_services(Config::for_tests());
    let a = services.upload("a.cbz", fixtures::three_page_cbz()).await;

    let err = services
        .coordinator
        .convert(
            ConversionMode::Combine,
            RenderSettings::default(),
            vec![
                ConversionJob::all_pages(a.id),
                ConversionJob::all_pages(Uuid::new_v4()),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_batch_zips_documents_in_job_order() {
    let services = setup_services(Config::for_tests());
    let first = services.upload("Zeta.cbz", fixtures::three_page_cbz()).await;
    let second = services.upload("alpha.cbz", fixtures::three_page_cbz()).await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Batch,
            RenderSettings::default(),
            vec![
                ConversionJob::all_pages(first.id),
                ConversionJob::with_pages(second.id, vec![1]),
            ],
        )
        .await
        .unwrap();

    assert!(output.is_zip);
    assert_eq!(output.filename, "comics.zip");
    assert_eq!(output.content_type(), "application/zip");

    let mut zip = zip::ZipArchive::new(Cursor::new(output.bytes)).unwrap();
    assert_eq!(zip.len(), 2);
    assert_eq!(zip.by_index(0).unwrap().name(), "Zeta.pdf");
    assert_eq!(zip.by_index(1).unwrap().name(), "alpha.pdf");

    let mut second_pdf = Vec::new();
    zip.by_index(1)
        .unwrap()
        .read_to_end(&mut second_pdf)
        .unwrap();
    let colors = fixtures::page_colors(&second_pdf);
    assert_eq!(colors.len(), 1);
    assert!(fixtures::close_to(colors[0], GREEN));
}

#[tokio::test]
async fn test_batch_keeps_partial_success() {
    let services = setup_services(Config::for_tests());
    let good = services.upload("good.cbz", fixtures::three_page_cbz()).await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Batch,
            RenderSettings::default(),
            vec![
                ConversionJob::all_pages(Uuid::new_v4()),
                ConversionJob::all_pages(good.id),
            ],
        )
        .await
        .unwrap();

    // Only one document survived, so it is sent as a plain PDF
    assert!(!output.is_zip);
    assert_eq!(output.filename, "good.pdf");
    assert_eq!(fixtures::pdf_page_count(&output.bytes), 3);
}

#[tokio::test]
async fn test_batch_fails_when_every_job_fails() {
    let services = setup_services(Config::for_tests());
    let good = services.upload("good.cbz", fixtures::three_page_cbz()).await;

    let err = services
        .coordinator
        .convert(
            ConversionMode::Batch,
            RenderSettings::default(),
            vec![
                ConversionJob::with_pages(good.id, vec![7]),
                ConversionJob::all_pages(Uuid::new_v4()),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_rejects_empty_and_invalid_requests() {
    let services = setup_services(Config::for_tests());
    let handle = services.upload("x.cbz", fixtures::three_page_cbz()).await;

    let err = services
        .coordinator
        .convert(ConversionMode::Single, RenderSettings::default(), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::with_pages(handle.id, vec![0, 3])],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::with_pages(handle.id, vec![])],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::all_pages(Uuid::new_v4())],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_corrupt_page_is_skipped() {
    let services = setup_services(Config::for_tests());
    let handle = services
        .upload(
            "broken.cbz",
            fixtures::cbz(&[
                ("01.jpg", fixtures::jpeg(RED, 30, 30)),
                ("02.jpg", b"definitely not a jpeg".to_vec()),
                ("03.jpg", fixtures::jpeg(BLUE, 30, 30)),
            ]),
        )
        .await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::all_pages(handle.id)],
        )
        .await
        .unwrap();

    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 2);
    assert!(fixtures::close_to(colors[0], RED));
    assert!(fixtures::close_to(colors[1], BLUE));
}

#[tokio::test]
async fn test_all_pages_corrupt_is_an_error() {
    let services = setup_services(Config::for_tests());
    let handle = services
        .upload(
            "hopeless.cbz",
            fixtures::cbz(&[("01.jpg", b"nope".to_vec())]),
        )
        .await;

    let err = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::all_pages(handle.id)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExtractionFailed(_)));
}

#[tokio::test]
async fn test_rar_archive_converts_in_natural_order() {
    let services = setup_services(Config::for_tests());
    let handle = services.upload("issue-02.cbr", fixtures::three_page_cbr()).await;
    assert_eq!(handle.pages, vec!["a.jpg", "b.jpg", "c.jpg"]);

    let output = services
        .coordinator
        .convert(
            ConversionMode::Single,
            RenderSettings::default(),
            vec![ConversionJob::with_pages(handle.id, vec![2, 0, 1])],
        )
        .await
        .unwrap();

    assert_eq!(output.filename, "issue-02.pdf");
    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 3);
    assert!(fixtures::close_to(colors[0], BLUE));
    assert!(fixtures::close_to(colors[1], RED));
    assert!(fixtures::close_to(colors[2], GREEN));
}

#[tokio::test]
async fn test_combine_mixes_zip_and_rar() {
    let services = setup_services(Config::for_tests());
    let zip = services.upload("one.cbz", fixtures::three_page_cbz()).await;
    let rar = services.upload("two.cbr", fixtures::three_page_cbr()).await;

    let output = services
        .coordinator
        .convert(
            ConversionMode::Combine,
            RenderSettings::default(),
            vec![
                ConversionJob::with_pages(rar.id, vec![1]),
                ConversionJob::with_pages(zip.id, vec![2]),
            ],
        )
        .await
        .unwrap();

    let colors = fixtures::page_colors(&output.bytes);
    assert_eq!(colors.len(), 2);
    assert!(fixtures::close_to(colors[0], GREEN));
    assert!(fixtures::close_to(colors[1], BLUE));
}
