//! 회계 엔진.
//!
//! 전략마다 하나의 `Mutex<StrategyContext>`를 두어 같은 전략의 틱은 직렬화하고,
//! 서로 다른 전략의 틱은 병렬로 처리합니다. 틱은 컨텍스트 사본에서 계산되며
//! 저장소 커밋이 성공해야만 사본이 실제 상태가 됩니다.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fxsim_core::{
    tick_span, AppConfig, Price, ReferenceValues, SimError, SimResult, StrategyKind, TradeSignal,
};
use fxsim_store::{SimStore, TimeRange};
use tokio::sync::Mutex;
use tracing::{error, info, warn, Instrument};

use crate::context::{StrategyContext, TickOutcome};
use crate::report::StrategyStatus;

/// 페이퍼 트레이딩 회계 엔진.
pub struct AccountingEngine<S: SimStore> {
    store: Arc<S>,
    contexts: HashMap<StrategyKind, Mutex<StrategyContext>>,
}

impl<S: SimStore> AccountingEngine<S> {
    /// 저장소에서 모든 전략의 상태를 읽어 엔진을 만듭니다.
    ///
    /// 설정 행이 없는 전략이 있으면 `NotInitialized`를 반환합니다.
    pub async fn load(store: Arc<S>) -> SimResult<Self> {
        let mut contexts = HashMap::new();
        for strategy in StrategyKind::ALL {
            let context = Self::load_context(store.as_ref(), strategy).await?;
            contexts.insert(strategy, Mutex::new(context));
        }
        Ok(Self { store, contexts })
    }

    /// 설정 행이 없는 전략은 애플리케이션 설정으로 초기화한 뒤 엔진을 만듭니다.
    pub async fn bootstrap(store: Arc<S>, app: &AppConfig) -> SimResult<Self> {
        for strategy in StrategyKind::ALL {
            if store.load_config(strategy).await?.is_none() {
                let config = app.settings_for(strategy).clone().into_config(strategy);
                config.validate()?;
                store.save_config(&config).await?;
                info!(
                    strategy = %strategy,
                    initial_capital = %config.initial_capital,
                    "Strategy config seeded"
                );
            }
        }
        Self::load(store).await
    }

    async fn load_context(store: &S, strategy: StrategyKind) -> SimResult<StrategyContext> {
        let config = store
            .load_config(strategy)
            .await?
            .ok_or(SimError::NotInitialized(strategy))?;
        let open = store.load_open_position(strategy).await?;
        let last_tick = store.last_tick_time(strategy).await?;

        info!(
            strategy = %strategy,
            balance = %config.current_balance,
            open_position = open.is_some(),
            "Strategy state loaded"
        );
        StrategyContext::new(config, open, last_tick)
    }

    fn context(&self, strategy: StrategyKind) -> SimResult<&Mutex<StrategyContext>> {
        self.contexts
            .get(&strategy)
            .ok_or(SimError::NotInitialized(strategy))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 틱 하나를 처리합니다.
    ///
    /// 성공하면 잔고, 포지션, 거래 이력, 자산 로그가 모두 반영된 상태입니다.
    /// 실패하면 저장소와 메모리 상태 모두 틱 이전 그대로이며 원인이 반환됩니다.
    pub async fn on_tick(
        &self,
        strategy: StrategyKind,
        signal: TradeSignal,
        price: Price,
        reference: ReferenceValues,
        timestamp: DateTime<Utc>,
    ) -> SimResult<TickOutcome> {
        let span = tick_span!(strategy, signal, price);
        self.process_tick(strategy, signal, price, reference, timestamp)
            .instrument(span)
            .await
    }

    async fn process_tick(
        &self,
        strategy: StrategyKind,
        signal: TradeSignal,
        price: Price,
        reference: ReferenceValues,
        timestamp: DateTime<Utc>,
    ) -> SimResult<TickOutcome> {
        let mut guard = self.context(strategy)?.lock().await;

        let mut working = guard.clone();
        let (commit, outcome) = match working.apply(signal, price, reference, timestamp) {
            Ok(result) => result,
            Err(e) => {
                if e.is_fatal() {
                    error!(error = %e, "Tick aborted");
                } else {
                    warn!(error = %e, "Tick rejected");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.store.commit_tick(&commit).await {
            error!(error = %e, "Tick commit failed, state rolled back");
            return Err(e.into());
        }

        *guard = working;
        Ok(outcome)
    }

    /// 메모리 상태를 저장소에서 다시 읽습니다.
    pub async fn reload(&self, strategy: StrategyKind) -> SimResult<()> {
        let mut guard = self.context(strategy)?.lock().await;
        *guard = Self::load_context(self.store.as_ref(), strategy).await?;
        Ok(())
    }

    /// 현재 전략 컨텍스트의 사본.
    pub async fn snapshot(&self, strategy: StrategyKind) -> SimResult<StrategyContext> {
        Ok(self.context(strategy)?.lock().await.clone())
    }

    /// 전략의 지갑 현황.
    pub async fn status(&self, strategy: StrategyKind) -> SimResult<StrategyStatus> {
        let context = self.snapshot(strategy).await?;
        let trades = self
            .store
            .trade_history(strategy, TimeRange::all())
            .await?;
        Ok(StrategyStatus::build(&context, &trades))
    }

    /// 모든 전략의 지갑 현황.
    pub async fn wallets(&self) -> SimResult<Vec<StrategyStatus>> {
        let mut wallets = Vec::with_capacity(StrategyKind::ALL.len());
        for strategy in StrategyKind::ALL {
            wallets.push(self.status(strategy).await?);
        }
        Ok(wallets)
    }
}
