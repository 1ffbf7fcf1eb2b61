//! Aggregate statistics, recomputed by a full traversal on every call.

use super::path::NamespacePath;
use super::store::ContextTreeStore;
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;

/// Whole-tree statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub domains: usize,
    pub topics: usize,
    pub subtopics: usize,
    pub documents: usize,
    /// Sum of document sizes in bytes.
    pub total_size: u64,
    /// Most recent document modification time, if any document exists.
    pub last_updated: Option<DateTime<Utc>>,
    pub domain_info: Vec<DomainStats>,
}

/// Statistics for a single domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainStats {
    pub name: String,
    pub topics: usize,
    pub subtopics: usize,
    pub documents: usize,
    pub size: u64,
}

impl ContextTreeStore {
    /// Walk the entire tree. Any IO failure fails the whole call.
    pub async fn get_stats(&self) -> StoreResult<TreeStats> {
        let mut stats = TreeStats::default();

        for domain in self.list_domains().await? {
            let mut info = DomainStats {
                name: domain.clone(),
                ..Default::default()
            };

            for topic in self.list_topics(&domain).await? {
                info.topics += 1;
                let topic_path = NamespacePath::new(domain.as_str(), topic.as_str());
                self.tally_node(&topic_path, &mut info, &mut stats.last_updated)
                    .await?;

                for subtopic in self.list_subtopics(&domain, &topic).await? {
                    info.subtopics += 1;
                    let sub_path = topic_path.clone().with_subtopic(subtopic);
                    self.tally_node(&sub_path, &mut info, &mut stats.last_updated)
                        .await?;
                }
            }

            stats.domains += 1;
            stats.topics += info.topics;
            stats.subtopics += info.subtopics;
            stats.documents += info.documents;
            stats.total_size += info.size;
            stats.domain_info.push(info);
        }

        Ok(stats)
    }

    async fn tally_node(
        &self,
        path: &NamespacePath,
        info: &mut DomainStats,
        last_updated: &mut Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let dir = self.node_dir(path)?;
        for memory in self.list_memories(path).await? {
            let metadata = fs::metadata(dir.join(&memory)).await?;
            info.documents += 1;
            info.size += metadata.len();

            let modified: DateTime<Utc> = metadata.modified()?.into();
            if last_updated.map_or(true, |current| modified > current) {
                *last_updated = Some(modified);
            }
        }
        Ok(())
    }
}

impl TreeStats {
    /// Stats for one domain by name.
    pub fn domain(&self, name: &str) -> Option<&DomainStats> {
        self.domain_info.iter().find(|d| d.name == name)
    }
}
