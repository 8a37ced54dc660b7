//! Signal intake and scoring orchestration.
//!
//! # Responsibility
//! - Validate one signal batch, score it against the day's state, and
//!   persist signals, ledger entries, subskill rollups and the user
//!   aggregate in one transaction.
//!
//! # Invariants
//! - A rejected request writes nothing.
//! - The day's signal XP total never exceeds the configured cap.
//! - Signal intake does not advance goals; only reflections do under
//!   current wiring.

use crate::clock::Clock;
use crate::config::ScoringConfig;
use crate::model::ledger::{XpLedgerEntry, XpSource};
use crate::model::signal::{Signal, SignalDraft};
use crate::model::user::UserId;
use crate::progression::scoring::{score_signal_batch, DayState};
use crate::progression::streak::{advance_streak, StreakState};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::signal_repo::{SignalRepository, SqliteSignalRepository};
use crate::repo::user_repo::{ProgressDelta, SqliteUserRepository, UserRepository};
use crate::service::{load_or_bootstrap_user, ServiceError};
use chrono::{Days, NaiveDate};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

/// One signal-batch intake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalIntakeRequest {
    pub user_id: UserId,
    /// Defaults to today; must be today or yesterday.
    pub date: Option<NaiveDate>,
    pub signals: Vec<SignalDraft>,
}

/// Outcome of one committed signal intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalIntakeResult {
    pub signals: Vec<Signal>,
    /// Capped, diminished signal XP.
    pub xp_earned: i64,
    /// Cap-exempt variety bonus.
    pub variety_bonus: i64,
    /// `xp_earned + variety_bonus`, the aggregate delta applied.
    pub total_awarded: i64,
}

/// Signal intake orchestrator.
pub struct SignalService<'conn, C: Clock> {
    conn: &'conn mut Connection,
    config: ScoringConfig,
    clock: C,
}

impl<'conn, C: Clock> SignalService<'conn, C> {
    /// Creates the service after validating the scoring configuration.
    pub fn try_new(
        conn: &'conn mut Connection,
        config: ScoringConfig,
        clock: C,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self {
            conn,
            config,
            clock,
        })
    }

    /// Validates, scores and persists one signal batch atomically.
    pub fn log_signals(
        &mut self,
        request: &SignalIntakeRequest,
    ) -> Result<SignalIntakeResult, ServiceError> {
        if request.signals.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "signal batch must not be empty".to_string(),
            ));
        }
        for draft in &request.signals {
            draft
                .validate()
                .map_err(|err| ServiceError::InvalidRequest(err.to_string()))?;
        }

        let today = self.clock.today();
        let effective_date = request.date.unwrap_or(today);
        let yesterday = today.checked_sub_days(Days::new(1));
        if effective_date != today && Some(effective_date) != yesterday {
            return Err(ServiceError::DateOutOfWindow {
                given: effective_date,
                today,
            });
        }

        let now_ms = self.clock.now_epoch_ms();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::repo::RepoError::from)?;

        let user = load_or_bootstrap_user(
            &tx,
            self.config.auto_provision_users,
            now_ms,
            request.user_id,
        )?;

        let signal_repo = SqliteSignalRepository::try_new(&tx)?;
        let ledger_repo = SqliteLedgerRepository::try_new(&tx)?;

        let existing = signal_repo.list_for_date(user.id, effective_date)?;
        let day = DayState::from_signals(&existing);
        let score = score_signal_batch(&self.config, &day, &request.signals);

        let mut persisted = Vec::with_capacity(request.signals.len());
        for (draft, &xp) in request.signals.iter().zip(&score.per_signal_xp) {
            let signal = Signal {
                id: Uuid::new_v4(),
                user_id: user.id,
                subskill_id: draft.subskill_id.clone(),
                template_id: draft.template_id.clone(),
                logged_for_date: effective_date,
                xp_earned: xp,
                note: draft.note.clone(),
                created_at: now_ms,
            };
            signal_repo.insert_signal(&signal)?;
            ledger_repo.append(&XpLedgerEntry::new(
                user.id,
                xp,
                XpSource::Signal,
                Some(signal.id),
                format!("signal {}:{}", draft.subskill_id, draft.template_id),
                now_ms,
            ))?;
            signal_repo.upsert_subskill_progress(
                user.id,
                &draft.subskill_id,
                xp,
                effective_date,
            )?;
            persisted.push(signal);
        }

        if score.variety_bonus > 0 {
            ledger_repo.append(&XpLedgerEntry::new(
                user.id,
                score.variety_bonus,
                XpSource::VarietyBonus,
                None,
                "variety bonus for new subskills".to_string(),
                now_ms,
            ))?;
        }

        // Streak continuity is evaluated against the wall-clock day of the
        // write, not the batch's logged-for date.
        let streak = advance_streak(
            StreakState {
                current: user.current_streak,
                longest: user.longest_streak,
                last_log_date: user.last_log_date,
            },
            today,
        );

        SqliteUserRepository::try_new(&tx)?.apply_progress(
            user.id,
            &ProgressDelta {
                xp_delta: score.total_awarded,
                streak,
            },
        )?;

        tx.commit().map_err(crate::repo::RepoError::from)?;

        info!(
            "event=signal_intake module=service status=ok user={} signals={} xp={} bonus={} streak={}",
            user.id,
            persisted.len(),
            score.total_new_xp,
            score.variety_bonus,
            streak.current
        );

        Ok(SignalIntakeResult {
            signals: persisted,
            xp_earned: score.total_new_xp,
            variety_bonus: score.variety_bonus,
            total_awarded: score.total_awarded,
        })
    }
}
