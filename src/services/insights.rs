// src/services/insights.rs

//! Admin insights: per-account interest signals and trending topics.
//!
//! A full scan over accounts, likes, follows and post topics. Meant for
//! occasional admin use, not for request-path ranking.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        account::Account,
        follow::FollowEdge,
        insight::{AccountInsight, InsightsReport, SystemOverview, TopicCount},
        like::LikeEdge,
    },
    store::{Store, StoreError},
};

/// Topics named in a strategy label before it is cut off with "...".
pub const STRATEGY_TOPIC_LIMIT: usize = 5;
pub const TRENDING_LIMIT: usize = 10;
pub const GENERAL_RECENCY_LABEL: &str = "General Recency (New User / No Likes with Topics)";

/// Everything the aggregation reads, loaded up front.
struct Snapshot {
    accounts: Vec<Account>,
    likes: Vec<LikeEdge>,
    topics_by_post: HashMap<Uuid, Vec<String>>,
    all_topics: Vec<Vec<String>>,
    post_owners: Vec<Uuid>,
    follows: Vec<FollowEdge>,
}

async fn load_snapshot(store: &dyn Store) -> Result<Snapshot, StoreError> {
    let accounts = store.list_accounts().await?;
    let likes = store.list_likes().await?;

    let mut seen = HashSet::new();
    let liked_post_ids: Vec<Uuid> = likes
        .iter()
        .map(|l| l.post_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let topics_by_post = if liked_post_ids.is_empty() {
        HashMap::new()
    } else {
        store.post_topics(&liked_post_ids).await?
    };

    Ok(Snapshot {
        accounts,
        likes,
        topics_by_post,
        all_topics: store.all_post_topics().await?,
        post_owners: store.list_post_owners().await?,
        follows: store.list_follows().await?,
    })
}

/// Distinct, non-blank topics of the liked posts in first-seen order.
/// Posts without topics contribute nothing.
pub fn derive_topics<'a>(
    liked_post_ids: impl IntoIterator<Item = &'a Uuid>,
    topics_by_post: &HashMap<Uuid, Vec<String>>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    liked_post_ids
        .into_iter()
        .filter_map(|id| topics_by_post.get(id))
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .filter(|t| seen.insert(*t))
        .cloned()
        .collect()
}

pub fn strategy_label(topics: &[String]) -> String {
    if topics.is_empty() {
        return GENERAL_RECENCY_LABEL.to_string();
    }

    let shown = topics
        .iter()
        .take(STRATEGY_TOPIC_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let ellipsis = if topics.len() > STRATEGY_TOPIC_LIMIT { "..." } else { "" };
    format!("Topics: {}{}", shown, ellipsis)
}

/// Counts every non-blank label across the given topic lists and returns the
/// `limit` most frequent. Equal counts keep the order labels were first seen.
pub fn trending_topics(topic_lists: &[Vec<String>], limit: usize) -> Vec<TopicCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<TopicCount> = Vec::new();

    for topic in topic_lists.iter().flatten() {
        if topic.trim().is_empty() {
            continue;
        }
        match index.get(topic.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(topic.as_str(), counts.len());
                counts.push(TopicCount {
                    topic: topic.clone(),
                    count: 1,
                });
            }
        }
    }

    // stable: ties stay in discovery order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

fn build_report(snapshot: Snapshot) -> InsightsReport {
    let mut likes_by_user: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for like in &snapshot.likes {
        likes_by_user.entry(like.user_id).or_default().push(like.post_id);
    }

    let mut posts_by_owner: HashMap<Uuid, i64> = HashMap::new();
    for owner in &snapshot.post_owners {
        *posts_by_owner.entry(*owner).or_default() += 1;
    }

    let mut followers: HashMap<Uuid, i64> = HashMap::new();
    let mut following: HashMap<Uuid, i64> = HashMap::new();
    for edge in &snapshot.follows {
        *followers.entry(edge.followed_id).or_default() += 1;
        *following.entry(edge.follower_id).or_default() += 1;
    }

    let accounts = snapshot
        .accounts
        .into_iter()
        .map(|account| {
            let liked = likes_by_user.get(&account.id).map(Vec::as_slice).unwrap_or(&[]);
            let derived_topics = derive_topics(liked, &snapshot.topics_by_post);
            let fyp_strategy = strategy_label(&derived_topics);

            AccountInsight {
                posts_count: posts_by_owner.get(&account.id).copied().unwrap_or(0),
                followers_count: followers.get(&account.id).copied().unwrap_or(0),
                following_count: following.get(&account.id).copied().unwrap_or(0),
                liked_posts_count: liked.len() as i64,
                derived_topics,
                fyp_strategy,
                id: account.id,
                username: account.username,
                is_admin: account.is_admin,
                created_at: account.created_at,
            }
        })
        .collect();

    InsightsReport {
        accounts,
        trending: trending_topics(&snapshot.all_topics, TRENDING_LIMIT),
    }
}

/// Runs the full aggregation. Any failed read aborts it; no partial report.
pub async fn compute_insights(store: &dyn Store) -> Result<InsightsReport, AppError> {
    let snapshot = load_snapshot(store).await.map_err(|e| {
        tracing::error!("Insights aggregation aborted: {}", e);
        AppError::from(e)
    })?;

    let report = build_report(snapshot);
    tracing::info!(
        "Insights computed for {} accounts, {} trending topics",
        report.accounts.len(),
        report.trending.len()
    );
    Ok(report)
}

/// Platform totals plus the trending topics.
pub async fn system_overview(store: &dyn Store) -> Result<SystemOverview, AppError> {
    let load = async {
        Ok::<_, StoreError>(SystemOverview {
            total_users: store.count_accounts().await?,
            total_posts: store.count_posts().await?,
            total_likes: store.count_likes().await?,
            top_topics: trending_topics(&store.all_post_topics().await?, TRENDING_LIMIT),
        })
    };

    load.await.map_err(|e| {
        tracing::error!("System overview failed: {}", e);
        AppError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        engagement::toggle_like,
        social::follow,
        test_support::{seed_account, seed_post},
    };
    use crate::store::MemoryStore;

    fn topics(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn insight_for(report: &InsightsReport, id: Uuid) -> &AccountInsight {
        report.accounts.iter().find(|a| a.id == id).unwrap()
    }

    #[tokio::test]
    async fn liked_topics_flow_into_insights_and_trending() {
        let store = MemoryStore::new();
        let u1 = seed_account(&store, "u1").await;
        let u2 = seed_account(&store, "u2").await;
        let p1 = seed_post(&store, u1, "p1", &["sports", "news"]).await;
        seed_post(&store, u1, "p2", &["cooking"]).await;
        toggle_like(&store, p1.id, u2).await.unwrap();

        let report = compute_insights(&store).await.unwrap();

        let u2_insight = insight_for(&report, u2);
        assert_eq!(u2_insight.liked_posts_count, 1);
        let derived: HashSet<_> = u2_insight.derived_topics.iter().cloned().collect();
        assert_eq!(derived, HashSet::from(["sports".to_string(), "news".to_string()]));
        assert!(u2_insight.fyp_strategy.contains("sports"));
        assert!(u2_insight.fyp_strategy.contains("news"));

        let u1_insight = insight_for(&report, u1);
        assert_eq!(u1_insight.liked_posts_count, 0);
        assert_eq!(u1_insight.posts_count, 2);
        assert_eq!(u1_insight.fyp_strategy, GENERAL_RECENCY_LABEL);

        for name in ["sports", "news", "cooking"] {
            let entry = report.trending.iter().find(|t| t.topic == name).unwrap();
            assert_eq!(entry.count, 1);
        }
    }

    #[tokio::test]
    async fn likes_on_posts_without_topics_still_count() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;
        let post = seed_post(&store, a, "plain", &[]).await;
        toggle_like(&store, post.id, a).await.unwrap();

        let report = compute_insights(&store).await.unwrap();
        let insight = insight_for(&report, a);
        assert_eq!(insight.liked_posts_count, 1);
        assert!(insight.derived_topics.is_empty());
        assert_eq!(insight.fyp_strategy, GENERAL_RECENCY_LABEL);
    }

    #[tokio::test]
    async fn repeated_runs_agree() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;
        let b = seed_account(&store, "bob").await;
        follow(&store, a, b).await.unwrap();
        for (i, t) in ["rust", "go", "rust", "zig"].iter().enumerate() {
            let post = seed_post(&store, b, &format!("p{}", i), &[*t, "code"]).await;
            toggle_like(&store, post.id, a).await.unwrap();
        }

        let first = compute_insights(&store).await.unwrap();
        let second = compute_insights(&store).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(insight_for(&first, a).following_count, 1);
        assert_eq!(insight_for(&first, b).followers_count, 1);
    }

    #[tokio::test]
    async fn read_failure_aborts_everything() {
        let store = MemoryStore::new();
        seed_account(&store, "alice").await;
        store.set_offline(true);

        assert!(matches!(
            compute_insights(&store).await.unwrap_err(),
            AppError::DependencyError(_)
        ));
        assert!(matches!(
            system_overview(&store).await.unwrap_err(),
            AppError::DependencyError(_)
        ));
    }

    #[tokio::test]
    async fn overview_counts_everything() {
        let store = MemoryStore::new();
        let a = seed_account(&store, "alice").await;
        let b = seed_account(&store, "bob").await;
        let post = seed_post(&store, a, "p", &["music"]).await;
        toggle_like(&store, post.id, b).await.unwrap();

        let overview = system_overview(&store).await.unwrap();
        assert_eq!(overview.total_users, 2);
        assert_eq!(overview.total_posts, 1);
        assert_eq!(overview.total_likes, 1);
        assert_eq!(
            overview.top_topics,
            vec![TopicCount { topic: "music".to_string(), count: 1 }]
        );
    }

    #[test]
    fn label_truncates_after_five_topics() {
        let five = topics(&["a", "b", "c", "d", "e"]);
        assert_eq!(strategy_label(&five), "Topics: a, b, c, d, e");

        let six = topics(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(strategy_label(&six), "Topics: a, b, c, d, e...");

        assert_eq!(strategy_label(&[]), GENERAL_RECENCY_LABEL);
    }

    #[test]
    fn derived_topics_are_distinct_and_skip_unknown_posts() {
        let (p1, p2, missing) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let map = HashMap::from([
            (p1, topics(&["sports", "news"])),
            (p2, topics(&["news", "", "cooking"])),
        ]);

        let derived = derive_topics(&[p1, missing, p2, p1], &map);
        assert_eq!(derived, topics(&["sports", "news", "cooking"]));
    }

    #[test]
    fn trending_is_sorted_by_count_with_stable_ties() {
        let lists = vec![
            topics(&["b", "a"]),
            topics(&["a", "c", " "]),
            topics(&["C", "c"]),
        ];
        let trending = trending_topics(&lists, 10);
        let flat: Vec<_> = trending.iter().map(|t| (t.topic.as_str(), t.count)).collect();
        assert_eq!(flat, vec![("a", 2), ("c", 2), ("b", 1), ("C", 1)]);
    }

    #[test]
    fn trending_keeps_top_ten() {
        let lists: Vec<Vec<String>> = (0..15).map(|i| vec![format!("t{}", i)]).collect();
        assert_eq!(trending_topics(&lists, TRENDING_LIMIT).len(), 10);
    }
}
