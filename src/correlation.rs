use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AttributeIndex, Match, Outcome};
use crate::rounding::{percent, round1};

pub const BUCKET_WIDTH: f64 = 5.0;

/// Lower edge of the 5-point interval holding `rating_diff`. Floors toward negative infinity,
/// so `-0.1` lands in `-5`.
pub fn bucket_key(rating_diff: f64) -> i64 {
    ((rating_diff / BUCKET_WIDTH).floor() * BUCKET_WIDTH) as i64
}

pub fn bucket_label(bucket: i64) -> String {
    format!("{bucket:+} to {:+}", bucket + BUCKET_WIDTH as i64)
}

/// How a match went relative to the rating gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthResult {
    Stronger,
    Weaker,
    Draw,
}

impl StrengthResult {
    /// A decisive match with a zero rating gap counts as an upset.
    pub fn classify(outcome: Outcome, rating_diff: f64) -> Self {
        match outcome {
            Outcome::Draw => StrengthResult::Draw,
            Outcome::Home if rating_diff > 0.0 => StrengthResult::Stronger,
            Outcome::Away if rating_diff < 0.0 => StrengthResult::Stronger,
            _ => StrengthResult::Weaker,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StrengthTally {
    matches: u32,
    stronger_wins: u32,
    weaker_wins: u32,
    draws: u32,
}

impl StrengthTally {
    fn record(&mut self, result: StrengthResult) {
        self.matches += 1;
        match result {
            StrengthResult::Stronger => self.stronger_wins += 1,
            StrengthResult::Weaker => self.weaker_wins += 1,
            StrengthResult::Draw => self.draws += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketRow {
    pub bucket: i64,
    pub bucket_range: String,
    pub matches: u32,
    pub stronger_wins: u32,
    pub weaker_wins: u32,
    pub draws: u32,
    pub stronger_win_pct: f64,
    pub upset_pct: f64,
    pub draw_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRating {
    pub home: String,
    pub away: String,
    pub home_rating: f64,
    pub away_rating: f64,
    pub rating_diff: f64,
    pub outcome: Outcome,
    pub score: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub total_matches: u32,
    pub stronger_team_wins: u32,
    pub weaker_team_wins: u32,
    pub draws: u32,
    pub stronger_win_pct: f64,
    pub upset_pct: f64,
    pub draw_pct: f64,
    /// Ascending by bucket.
    pub buckets: Vec<BucketRow>,
    pub matches: Vec<MatchRating>,
    /// Matches dropped because one side had no attribute snapshot.
    pub skipped_matches: u32,
}

/// Relates rating gaps to outcomes. Matches where either team is missing from `index` are
/// excluded without error.
pub fn correlate_ratings<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
    index: &AttributeIndex,
) -> CorrelationReport {
    let mut overall = StrengthTally::default();
    let mut buckets: BTreeMap<i64, StrengthTally> = BTreeMap::new();
    let mut details = Vec::new();
    let mut skipped = 0u32;

    for m in matches {
        let Some((home, away)) = index.pair(m) else {
            skipped += 1;
            continue;
        };
        let home_rating = home.rating();
        let away_rating = away.rating();
        let rating_diff = home_rating - away_rating;
        let outcome = m.outcome();
        let result = StrengthResult::classify(outcome, rating_diff);

        overall.record(result);
        buckets.entry(bucket_key(rating_diff)).or_default().record(result);
        details.push(MatchRating {
            home: m.home_team.name.clone(),
            away: m.away_team.name.clone(),
            home_rating: round1(home_rating),
            away_rating: round1(away_rating),
            rating_diff: round1(rating_diff),
            outcome,
            score: m.score(),
        });
    }

    if skipped > 0 {
        log::debug!("rating correlation skipped {skipped} matches without attributes");
    }

    let buckets = buckets
        .into_iter()
        .map(|(bucket, t)| BucketRow {
            bucket,
            bucket_range: bucket_label(bucket),
            matches: t.matches,
            stronger_wins: t.stronger_wins,
            weaker_wins: t.weaker_wins,
            draws: t.draws,
            stronger_win_pct: round1(percent(t.stronger_wins, t.matches)),
            upset_pct: round1(percent(t.weaker_wins, t.matches)),
            draw_pct: round1(percent(t.draws, t.matches)),
        })
        .collect();

    CorrelationReport {
        total_matches: overall.matches,
        stronger_team_wins: overall.stronger_wins,
        weaker_team_wins: overall.weaker_wins,
        draws: overall.draws,
        stronger_win_pct: round1(percent(overall.stronger_wins, overall.matches)),
        upset_pct: round1(percent(overall.weaker_wins, overall.matches)),
        draw_pct: round1(percent(overall.draws, overall.matches)),
        buckets,
        matches: details,
        skipped_matches: skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Team, TeamAttributeSnapshot, match_date};
    use crate::testutil::{fixture, team_ref};

    fn team(name: &str, speed: i32, pressure: i32, shooting: i32) -> Team {
        Team {
            api_id: team_ref(name).api_id,
            long_name: name.to_string(),
            short_name: name[..1].to_string(),
            attributes: vec![TeamAttributeSnapshot {
                date: match_date::parse("2015-09-10").unwrap(),
                build_up_play_speed: Some(speed),
                defence_pressure: Some(pressure),
                chance_creation_shooting: Some(shooting),
                defence_aggression: None,
            }],
        }
    }

    #[test]
    fn bucket_floors_toward_negative_infinity() {
        assert_eq!(bucket_key(-0.1), -5);
        assert_eq!(bucket_key(-3.0), -5);
        assert_eq!(bucket_key(0.0), 0);
        assert_eq!(bucket_key(4.99), 0);
        assert_eq!(bucket_key(5.0), 5);
        assert_eq!(bucket_key(-10.0), -10);
        assert_eq!(bucket_label(-5), "-5 to +0");
        assert_eq!(bucket_label(5), "+5 to +10");
    }

    #[test]
    fn stronger_weaker_and_skipped() {
        let teams = vec![team("Strong", 70, 70, 70), team("Weak", 40, 40, 40)];
        let index = AttributeIndex::from_teams(&teams);
        let matches = vec![
            fixture(1, "2015-08-08", "Strong", "Weak", 2, 0),
            fixture(2, "2015-08-15", "Weak", "Strong", 1, 0),
            fixture(3, "2015-08-22", "Weak", "Strong", 1, 1),
            fixture(4, "2015-08-29", "Strong", "Unknown", 3, 0),
        ];
        let report = correlate_ratings(&matches, &index);
        assert_eq!(report.total_matches, 3);
        assert_eq!(report.stronger_team_wins, 1);
        assert_eq!(report.weaker_team_wins, 1);
        assert_eq!(report.draws, 1);
        assert_eq!(report.skipped_matches, 1);
        assert_eq!(report.stronger_win_pct, 33.3);
        let keys: Vec<i64> = report.buckets.iter().map(|b| b.bucket).collect();
        assert_eq!(keys, vec![-30, 30]);
        assert_eq!(report.buckets[0].matches, 2);
        assert_eq!(report.buckets[0].upset_pct, 50.0);
        assert_eq!(report.matches[0].rating_diff, 30.0);
    }

    #[test]
    fn even_ratings_make_decisive_results_upsets() {
        assert_eq!(
            StrengthResult::classify(Outcome::Home, 0.0),
            StrengthResult::Weaker
        );
        assert_eq!(
            StrengthResult::classify(Outcome::Away, -0.4),
            StrengthResult::Stronger
        );
    }
}
