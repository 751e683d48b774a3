//! The ARI engine
//!
//! Owns snapshot derivation (overall, trend, confidence), the
//! per-user write discipline, skill trajectories, deskilling checks,
//! and the Deep-Dive session registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_store::{ProfileStore, SnapshotStore};
use ags_types::{
    AgencySnapshot, AgsError, AgsResult, DimensionScores, KnowledgeProfile, SessionId, Trend,
    UserId,
};

use crate::config::AriConfig;
use crate::copilot::TaskCategory;
use crate::deepdive::{DeepDiveSession, DeepDiveStep, StepOutcome, SynthesisRubric};
use crate::deskilling::{DeskillingAlert, DeskillingSeverity};
use crate::passive::PassiveLexicalLayer;
use crate::stats;
use crate::trajectory::{SkillTrajectory, TrajectoryPoint};

/// One tracked interaction, as it arrives off the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackRequest {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub interaction_type: String,
    pub skill_category: String,
    pub dimension_scores: DimensionScores,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// The ARI engine. Cheap to share behind an `Arc`.
pub struct AriEngine {
    snapshots: Arc<dyn SnapshotStore>,
    profiles: Arc<dyn ProfileStore>,
    audit: Arc<dyn AuditSink>,
    config: AriConfig,
    passive: PassiveLexicalLayer,
    sessions: DashMap<SessionId, DeepDiveSession>,
    /// Per-user write serialization: one writer per user at a time
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl AriEngine {
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        profiles: Arc<dyn ProfileStore>,
        audit: Arc<dyn AuditSink>,
        config: AriConfig,
    ) -> Self {
        Self {
            snapshots,
            profiles,
            audit,
            config,
            passive: PassiveLexicalLayer::new(),
            sessions: DashMap::new(),
            user_locks: DashMap::new(),
        }
    }

    /// The background lexical layer, for feeding observed user text.
    pub fn passive_layer(&self) -> &PassiveLexicalLayer {
        &self.passive
    }

    fn user_lock(&self, user: &UserId) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Record one interaction and derive its snapshot.
    ///
    /// Out-of-range dimension scores are rejected before anything is
    /// persisted. When the snapshot store is unreachable the snapshot
    /// is still computed and returned, marked `degraded`, so gating can
    /// fall back to its conservative policy; duplicate calls are not
    /// deduplicated.
    pub fn track_interaction(&self, request: TrackRequest) -> AgsResult<AgencySnapshot> {
        request.dimension_scores.validate()?;

        let lock = self.user_lock(&request.user_id);
        let _guard = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let scores = self.passive.blend(
            &request.user_id,
            request.dimension_scores,
            self.config.passive_weight,
        );

        let window = self
            .config
            .trend_window
            .max(self.config.confidence_window.saturating_sub(1));
        let (priors, mut degraded) = match self.snapshots.recent(&request.user_id, window) {
            Ok(priors) => (priors, false),
            Err(AgsError::StoreUnavailable(reason)) => {
                warn!(user = %request.user_id, reason = %reason, "snapshot history unavailable");
                (Vec::new(), true)
            }
            Err(e) => return Err(e),
        };

        let trend = self.compute_trend(&priors, scores.mean());
        let confidence = self.compute_confidence(&priors, scores.mean());

        let mut snapshot = AgencySnapshot::new(
            request.user_id.clone(),
            request.session_id.clone(),
            request.skill_category.clone(),
            scores,
            trend,
            confidence,
        );

        if !degraded {
            match self.snapshots.append(snapshot.clone()) {
                Ok(()) => {}
                Err(AgsError::StoreUnavailable(reason)) => {
                    warn!(user = %request.user_id, reason = %reason, "snapshot not persisted");
                    degraded = true;
                }
                Err(e) => return Err(e),
            }
        }
        snapshot.degraded = degraded;

        if degraded {
            self.audit.record(
                AuditEvent::new("ari_degraded_mode", AuditSeverity::Warning)
                    .for_user(request.user_id.clone())
                    .with_details(json!({ "session_id": request.session_id.as_str() })),
            );
        } else {
            debug!(
                user = %request.user_id,
                overall = snapshot.overall_score,
                trend = ?snapshot.trend,
                "interaction tracked"
            );
            self.audit.record(
                AuditEvent::new("interaction_tracked", AuditSeverity::Info)
                    .for_user(request.user_id.clone())
                    .with_details(json!({
                        "session_id": request.session_id.as_str(),
                        "interaction_type": request.interaction_type,
                        "overall_score": snapshot.overall_score,
                    })),
            );
        }

        Ok(snapshot)
    }

    /// Trend over the last `trend_window` prior snapshots plus the new
    /// score. Stable until enough history exists.
    fn compute_trend(&self, priors: &[AgencySnapshot], new_overall: f64) -> Trend {
        if priors.len() < self.config.trend_window {
            return Trend::Stable;
        }
        let start = priors.len() - self.config.trend_window;
        let mut series: Vec<f64> = priors[start..].iter().map(|s| s.overall_score).collect();
        series.push(new_overall);

        let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let mean_delta = stats::mean(&deltas);

        if mean_delta > self.config.trend_epsilon {
            Trend::Improving
        } else if mean_delta < -self.config.trend_epsilon {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Confidence grows with sample count and shrinks with variance
    /// across the window.
    fn compute_confidence(&self, priors: &[AgencySnapshot], new_overall: f64) -> f64 {
        let take = self.config.confidence_window.saturating_sub(1);
        let start = priors.len().saturating_sub(take);
        let mut window: Vec<f64> = priors[start..].iter().map(|s| s.overall_score).collect();
        window.push(new_overall);

        let spread_penalty =
            (stats::stdev(&window) / self.config.confidence_stdev_scale).min(1.0);
        let sample_factor =
            (window.len() as f64 / self.config.confidence_window as f64).min(1.0);
        ((1.0 - spread_penalty) * sample_factor).clamp(0.0, 1.0)
    }

    /// History, fitted velocity, and projected mastery date for one
    /// skill. Extrapolates the fitted line to the mastery threshold;
    /// no projection when the slope is flat or negative.
    pub fn get_skill_trajectory(
        &self,
        user: &UserId,
        skill: &str,
        window_days: i64,
    ) -> AgsResult<SkillTrajectory> {
        let cutoff = Utc::now() - Duration::days(window_days);
        let points: Vec<TrajectoryPoint> = self
            .snapshots
            .history(user)?
            .into_iter()
            .filter(|s| s.skill_category == skill && s.timestamp >= cutoff)
            .map(|s| TrajectoryPoint {
                timestamp: s.timestamp,
                score: s.overall_score,
            })
            .collect();

        if points.is_empty() {
            return Err(AgsError::SnapshotNotFound(user.clone()));
        }

        let origin = points[0].timestamp;
        let xs: Vec<f64> = points
            .iter()
            .map(|p| (p.timestamp - origin).num_seconds() as f64 / 86_400.0)
            .collect();
        let ys: Vec<f64> = points.iter().map(|p| p.score).collect();
        let (slope, intercept) = stats::linear_fit(&xs, &ys);

        let projected_mastery = if slope > 0.0 {
            let last_x = *xs.last().unwrap_or(&0.0);
            let fitted_last = intercept + slope * last_x;
            if fitted_last >= self.config.mastery_threshold {
                Some(points[points.len() - 1].timestamp)
            } else {
                let days_needed = (self.config.mastery_threshold - fitted_last) / slope;
                Some(
                    points[points.len() - 1].timestamp
                        + Duration::seconds((days_needed * 86_400.0) as i64),
                )
            }
        } else {
            None
        };

        Ok(SkillTrajectory {
            user_id: user.clone(),
            skill: skill.to_string(),
            points,
            velocity_per_day: slope,
            projected_mastery,
        })
    }

    /// Check the trend window for a capability drop beyond `threshold`.
    pub fn detect_deskilling(
        &self,
        user: &UserId,
        threshold: f64,
    ) -> AgsResult<Option<DeskillingAlert>> {
        let window = self
            .snapshots
            .recent(user, self.config.trend_window + 1)?;
        if window.len() < 2 {
            return Ok(None);
        }

        let first = &window[0];
        let last = &window[window.len() - 1];
        let drop = first.overall_score - last.overall_score;
        if drop <= threshold {
            return Ok(None);
        }

        let affected_dimensions: Vec<_> = first
            .scores
            .iter()
            .filter(|(d, score)| score - last.scores.get(*d) > threshold)
            .map(|(d, _)| d)
            .collect();

        let severity =
            DeskillingAlert::severity_for(drop, threshold, affected_dimensions.len());
        let alert = DeskillingAlert {
            user_id: user.clone(),
            drop,
            affected_dimensions,
            severity,
            detected_at: Utc::now(),
        };

        warn!(user = %user, drop = drop, severity = ?alert.severity, "deskilling detected");
        self.audit.record(
            AuditEvent::new(
                "deskilling_detected",
                if alert.severity >= DeskillingSeverity::High {
                    AuditSeverity::Critical
                } else {
                    AuditSeverity::Warning
                },
            )
            .for_user(user.clone())
            .with_details(json!({
                "drop": alert.drop,
                "affected_dimensions": alert.affected_dimensions.len(),
            })),
        );

        Ok(Some(alert))
    }

    // ── Deep-Dive sessions ───────────────────────────────────────────

    /// Start an opt-in Deep-Dive baseline session. Creates the domain's
    /// knowledge profile on first use and resumes from its validated
    /// difficulty level.
    pub fn start_deep_dive(
        &self,
        user: &UserId,
        domain: &str,
        category: TaskCategory,
    ) -> AgsResult<SessionId> {
        let profile = match self.profiles.get(user, domain)? {
            Some(profile) => profile,
            None => {
                let profile = KnowledgeProfile::new(user.clone(), domain);
                self.profiles.put(profile.clone())?;
                profile
            }
        };

        let session = DeepDiveSession::new(
            user.clone(),
            domain,
            category,
            profile.validated_difficulty_level,
        );
        let session_id = session.session_id.clone();
        info!(user = %user, domain = domain, session = %session_id, "deep-dive session started");
        self.sessions.insert(session_id.clone(), session);
        Ok(session_id)
    }

    /// Grade one Deep-Dive response. Strong answers advance the ladder
    /// and raise the profile's (monotonic) skill ceiling.
    pub fn deep_dive_respond(
        &self,
        session_id: &SessionId,
        rubric: &SynthesisRubric,
    ) -> AgsResult<DeepDiveStep> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AgsError::SessionNotFound(session_id.clone()))?;

        let level_before = entry.level;
        let (bucket, outcome) = entry.grade(rubric)?;
        let (user_id, domain) = (entry.user_id.clone(), entry.domain.clone());
        drop(entry);

        let mut profile = self
            .profiles
            .get(&user_id, &domain)?
            .unwrap_or_else(|| KnowledgeProfile::new(user_id.clone(), &domain));
        if bucket.validates_level() {
            profile.raise_ceiling(rubric.overall(), level_before);
            self.profiles.put(profile.clone())?;
        }

        if let StepOutcome::Advanced { new_level } = &outcome {
            debug!(session = %session_id, level = ?new_level, "deep-dive advanced");
        }

        Ok(DeepDiveStep {
            bucket,
            outcome,
            skill_ceiling: profile.skill_ceiling,
        })
    }

    /// Accept the offered difficulty decrease.
    pub fn deep_dive_decrease(&self, session_id: &SessionId) -> AgsResult<()> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AgsError::SessionNotFound(session_id.clone()))?;
        entry.accept_decrease()?;
        Ok(())
    }

    /// Explicit user exit; the only way a session ends.
    pub fn exit_deep_dive(&self, session_id: &SessionId) -> AgsResult<()> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AgsError::SessionNotFound(session_id.clone()))?;
        entry.end();
        info!(session = %session_id, "deep-dive session ended by user");
        Ok(())
    }

    /// Knowledge profile lookup, for reporting.
    pub fn knowledge_profile(
        &self,
        user: &UserId,
        domain: &str,
    ) -> AgsResult<Option<KnowledgeProfile>> {
        self.profiles.get(user, domain)
    }
}
