use crate::crawlers::create_crawler;
use crate::entity_id::{EntityId, EntityType};
use crate::error::{Result, ScraperError};
use crate::fetch::PageFetcher;
use crate::processor::{NormalizedEntity, Processor};
use crate::types::{EntityCrawler, EntityRef};
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Per-run counters reported after a dispatch pass.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Routes a worklist to the per-type crawlers and persists each normalized
/// record the moment it is produced, so interrupted runs leave usable output
/// and reruns skip what is already on disk.
pub struct FetchDispatcher {
    crawlers: HashMap<EntityType, Arc<dyn EntityCrawler>>,
    processor: Arc<Processor>,
}

impl FetchDispatcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        let mut crawlers: HashMap<EntityType, Arc<dyn EntityCrawler>> = HashMap::new();
        for entity_type in [
            EntityType::Restaurant,
            EntityType::Hotel,
            EntityType::Attraction,
        ] {
            crawlers.insert(entity_type, create_crawler(entity_type, fetcher.clone()));
        }
        Self {
            crawlers,
            processor: Arc::new(Processor::new()),
        }
    }

    /// Dispatcher over an explicit crawler set; used by tests.
    pub fn with_crawlers(crawlers: HashMap<EntityType, Arc<dyn EntityCrawler>>) -> Self {
        Self {
            crawlers,
            processor: Arc::new(Processor::new()),
        }
    }

    /// Reads the worklist: a JSON array of `{id, url}` objects. A missing or
    /// malformed file aborts the whole run.
    pub fn load_work(path: &Path) -> Result<Vec<EntityRef>> {
        let content = fs::read_to_string(path).map_err(|e| ScraperError::InputRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ScraperError::InputRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Drops refs whose output file already exists. Runs to completion before
    /// any fetch is issued; previously completed entities are never
    /// re-fetched, even if the source page has changed since.
    pub fn filter_pending(refs: Vec<EntityRef>, output_dir: &Path) -> Vec<EntityRef> {
        refs.into_iter()
            .filter(|entity| match EntityId::storage_path(output_dir, &entity.id) {
                Ok(path) => !path.exists(),
                // Unroutable ids are kept so dispatch reports them
                Err(_) => true,
            })
            .collect()
    }

    /// Partitions `refs` by entity type and fans each partition out to its
    /// crawler, one concurrent task per entity. A single entity's failure is
    /// reported and counted without touching its siblings.
    pub async fn dispatch(&self, refs: Vec<EntityRef>, output_dir: &Path) -> DispatchSummary {
        let mut summary = DispatchSummary {
            total: refs.len(),
            ..Default::default()
        };

        let mut partitions: HashMap<EntityType, Vec<EntityRef>> = HashMap::new();
        for entity in refs {
            match EntityId::parse(&entity.id) {
                Ok(parsed) => partitions
                    .entry(parsed.entity_type)
                    .or_default()
                    .push(entity),
                Err(e) => {
                    warn!(id = %entity.id, "skipping unroutable entity: {}", e);
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", entity.id, e));
                }
            }
        }

        let routable: usize = partitions.values().map(Vec::len).sum();
        let progress = ProgressBar::new(routable as u64);
        let mut tasks = JoinSet::new();

        for (entity_type, partition) in partitions {
            let crawler = match self.crawlers.get(&entity_type) {
                Some(crawler) => Arc::clone(crawler),
                None => {
                    for entity in partition {
                        warn!(id = %entity.id, "no crawler registered for this type");
                        summary.failed += 1;
                        summary
                            .errors
                            .push(format!("{}: no crawler registered", entity.id));
                        progress.inc(1);
                    }
                    continue;
                }
            };

            info!(
                crawler = crawler.crawler_name(),
                entities = partition.len(),
                "dispatching partition"
            );
            for entity in partition {
                let crawler = Arc::clone(&crawler);
                let processor = Arc::clone(&self.processor);
                let output_dir = output_dir.to_path_buf();
                tasks.spawn(async move {
                    let id = entity.id.clone();
                    let outcome = fetch_one(crawler.as_ref(), &processor, &entity, &output_dir).await;
                    (id, outcome)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            // One unit of work terminated, success or failure alike
            progress.inc(1);
            match joined {
                Ok((_, Ok(()))) => summary.completed += 1,
                Ok((id, Err(e))) => {
                    error!(id = %id, "entity failed: {}", e);
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", id, e));
                }
                Err(e) => {
                    summary.failed += 1;
                    summary.errors.push(format!("fetch task panicked: {}", e));
                }
            }
        }
        progress.finish_and_clear();

        info!(
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed,
            "dispatch finished"
        );
        summary
    }
}

/// One entity end to end: crawl, normalize, persist. A failure at any step
/// leaves no output file, so a rerun will retry this entity.
async fn fetch_one(
    crawler: &dyn EntityCrawler,
    processor: &Processor,
    entity: &EntityRef,
    output_dir: &Path,
) -> Result<()> {
    let raw = crawler.crawl(entity).await?;
    let normalized = processor.process_entity(&entity.id, &raw)?;
    persist(output_dir, &normalized)
}

fn persist(output_dir: &Path, entity: &NormalizedEntity) -> Result<()> {
    let path = EntityId::storage_path(output_dir, &entity.id)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(entity)?)?;
    Ok(())
}
