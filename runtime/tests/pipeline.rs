use seo_pipeline::audit::{HealthAuditor, IssueType, OverallHealth};
use seo_pipeline::config::SeoConfig;
use seo_pipeline::entity::{ApprovalStatus, EntityStore, EntityType, MemoryStore};
use seo_pipeline::pipeline::Pipeline;
use seo_pipeline::seo::parse_robots;
use seo_pipeline::sitemap::{sitemap_locs, FileSitemapSink, INDEX_FILE, ROBOTS_FILE};
use seo_pipeline::testing::{self, BASE_URL};
use std::sync::Arc;

fn write_store(dir: &std::path::Path) -> std::path::PathBuf {
    let mut pending = testing::clinic("c2", "Pune Eye Hospital");
    pending.status = ApprovalStatus::Pending;
    let body = serde_json::json!({
        "clinics": [testing::clinic("c1", "Smile Dental"), pending],
        "doctors": [testing::doctor("d1", "Asha Rao")],
        "blogs": [testing::blog("b1", "How to keep your teeth healthy")],
    });
    let path = dir.join("entities.json");
    std::fs::write(&path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    path
}

fn config(sitemap_dir: &std::path::Path) -> SeoConfig {
    SeoConfig {
        base_url: BASE_URL.to_string(),
        sitemap_dir: sitemap_dir.to_path_buf(),
        ping_enabled: false,
        event_log: None,
        ..SeoConfig::default()
    }
}

#[tokio::test]
async fn test_pipeline_writes_sitemaps_and_audit_reads_them_back() {
    let dir = tempfile::tempdir().unwrap();
    let sitemap_dir = dir.path().join("public");
    let store: Arc<dyn EntityStore> =
        Arc::new(MemoryStore::from_file(&write_store(dir.path())).unwrap());
    let config = config(&sitemap_dir);

    let pipeline = Pipeline::new(
        store.clone(),
        &config,
        Arc::new(FileSitemapSink::new(&sitemap_dir)),
        None,
    );
    let run = pipeline.run(EntityType::Clinic, "c1").await;
    assert!(run.report.success, "{:?}", run.report.errors);
    assert!(run.ping.is_none());

    let index = std::fs::read_to_string(sitemap_dir.join(INDEX_FILE)).unwrap();
    let locs = sitemap_locs(&index).unwrap();
    assert_eq!(locs.len(), 4);
    assert!(locs.contains(&"https://example.com/sitemap-clinics.xml".to_string()));

    let clinics = std::fs::read_to_string(sitemap_dir.join("sitemap-clinics.xml")).unwrap();
    let clinic_locs = sitemap_locs(&clinics).unwrap();
    assert_eq!(clinic_locs, vec!["https://example.com/clinics/smile-dental".to_string()]);

    let robots = std::fs::read_to_string(sitemap_dir.join(ROBOTS_FILE)).unwrap();
    assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
    let rules = parse_robots(&robots, "*");

    let auditor = HealthAuditor::new(store, pipeline.policy().clone(), BASE_URL)
        .with_robots_rules(rules);
    let targets = vec![
        (EntityType::Clinic, "c1".to_string()),
        (EntityType::Clinic, "c2".to_string()),
        (EntityType::Doctor, "missing".to_string()),
    ];
    let results = auditor.audit_many(&targets).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].entity_id, "c1");
    assert_eq!(results[0].score, 100);
    assert!(!results[0].has_issue(IssueType::RobotsConflict));

    assert_eq!(results[1].entity_id, "c2");
    assert!(!results[1].indexable);
    assert_eq!(results[1].overall_health, OverallHealth::Critical);

    assert_eq!(results[2].entity_id, "missing");
    assert_eq!(results[2].issues[0].message, "Doctor not found");
}

#[tokio::test]
async fn test_non_indexable_run_leaves_sitemaps_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let sitemap_dir = dir.path().join("public");
    let store: Arc<dyn EntityStore> =
        Arc::new(MemoryStore::from_file(&write_store(dir.path())).unwrap());

    let pipeline = Pipeline::new(
        store,
        &config(&sitemap_dir),
        Arc::new(FileSitemapSink::new(&sitemap_dir)),
        None,
    );
    let report = pipeline.run(EntityType::Clinic, "c2").await.report;

    assert!(report.success);
    assert_eq!(report.robots.content, "noindex, nofollow");
    assert!(!sitemap_dir.join(INDEX_FILE).exists());
}
