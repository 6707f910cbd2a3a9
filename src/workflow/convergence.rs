//! 核查-修正收敛循环 - 流程层
//!
//! 反复执行"评估 → 修正"，直到评估通过或次数用尽。
//!
//! 状态流转：
//! ```text
//! 开始 → 评估(第1次)
//! 评估: 通过                  → 已通过（结束，返回当前题目）
//!       驳回 且 次数 < 上限   → 修正 → 评估(次数+1)
//!       驳回 且 次数 == 上限  → 已耗尽（结束，返回当前题目，不再修正）
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::AppResult;

/// 默认最大评估次数
pub const DEFAULT_MAX_FIX_ATTEMPTS: u32 = 3;

/// 一次评估的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// 驳回，附带给修正步骤使用的修改意见
    Reject(String),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// 循环的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// 最后一次评估通过
    Accepted,
    /// 次数用尽，结果是尽力而为的版本
    Exhausted,
}

/// 循环结果
#[derive(Debug, Clone, PartialEq)]
pub struct Converged<T> {
    pub item: T,
    pub outcome: LoopOutcome,
    /// 评估次数
    pub attempts: u32,
    /// 修正次数
    pub revisions: u32,
    /// 最后一次驳回的意见（已通过时为 None）
    pub last_reason: Option<String>,
}

impl<T> Converged<T> {
    pub fn is_accepted(&self) -> bool {
        self.outcome == LoopOutcome::Accepted
    }
}

/// 评估与修正两个步骤
///
/// 两个步骤各自内部通常是一次结构化输出调用。解析失败时评估步骤应返回
/// `Verdict::Reject`，不能默认通过。
#[async_trait]
pub trait Refiner: Send + Sync {
    type Item: Send + Sync;

    async fn evaluate(&self, item: &Self::Item) -> AppResult<Verdict>;

    async fn revise(&self, item: &Self::Item, reason: &str) -> AppResult<Self::Item>;
}

/// 收敛循环
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceLoop {
    max_attempts: u32,
}

impl Default for ConvergenceLoop {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FIX_ATTEMPTS)
    }
}

impl ConvergenceLoop {
    /// `max_attempts` 小于 1 时按 1 处理
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 执行循环
    ///
    /// 评估或修正返回的错误（生成器不可用）会直接向上传播，中间状态丢弃。
    pub async fn run<R>(&self, item: R::Item, refiner: &R) -> AppResult<Converged<R::Item>>
    where
        R: Refiner + ?Sized,
    {
        let mut item = item;
        let mut revisions = 0;
        let mut attempt = 1;

        loop {
            info!("第{}/{}次核查中", attempt, self.max_attempts);

            let reason = match refiner.evaluate(&item).await? {
                Verdict::Accept => {
                    info!("第{}次核查通过", attempt);
                    return Ok(Converged {
                        item,
                        outcome: LoopOutcome::Accepted,
                        attempts: attempt,
                        revisions,
                        last_reason: None,
                    });
                }
                Verdict::Reject(reason) => reason,
            };

            if attempt >= self.max_attempts {
                warn!(
                    "已达到最大核查次数 {}，返回最后一次修正结果",
                    self.max_attempts
                );
                return Ok(Converged {
                    item,
                    outcome: LoopOutcome::Exhausted,
                    attempts: attempt,
                    revisions,
                    last_reason: Some(reason),
                });
            }

            info!("第{}次核查未通过，修正中", attempt);
            item = refiner.revise(&item, &reason).await?;
            revisions += 1;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本返回评估结论，修正时按脚本返回新版本
    struct ScriptedRefiner {
        verdicts: Mutex<VecDeque<AppResult<Verdict>>>,
        revisions: Mutex<VecDeque<String>>,
        evaluated: Mutex<Vec<String>>,
        revised: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedRefiner {
        fn new(verdicts: Vec<AppResult<Verdict>>, revisions: Vec<&str>) -> Self {
            Self {
                verdicts: Mutex::new(verdicts.into()),
                revisions: Mutex::new(revisions.into_iter().map(String::from).collect()),
                evaluated: Mutex::new(Vec::new()),
                revised: Mutex::new(Vec::new()),
            }
        }

        fn always_reject() -> Self {
            Self::new(Vec::new(), Vec::new())
        }

        fn evaluate_calls(&self) -> Vec<String> {
            self.evaluated.lock().unwrap().clone()
        }

        fn revise_calls(&self) -> Vec<(String, String)> {
            self.revised.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Refiner for ScriptedRefiner {
        type Item = String;

        async fn evaluate(&self, item: &String) -> AppResult<Verdict> {
            self.evaluated.lock().unwrap().push(item.clone());
            self.verdicts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Verdict::Reject("R".to_string())))
        }

        async fn revise(&self, item: &String, reason: &str) -> AppResult<String> {
            self.revised
                .lock()
                .unwrap()
                .push((item.clone(), reason.to_string()));
            Ok(self
                .revisions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| item.clone()))
        }
    }

    #[tokio::test]
    async fn test_accept_first_time_no_revision() {
        let refiner = ScriptedRefiner::new(vec![Ok(Verdict::Accept)], vec![]);

        let result = ConvergenceLoop::new(3)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap();

        assert_eq!(result.item, "Q0");
        assert!(result.is_accepted());
        assert_eq!(result.attempts, 1);
        assert_eq!(result.revisions, 0);
        assert!(refiner.revise_calls().is_empty());
    }

    #[tokio::test]
    async fn test_always_reject_unchanged_item_exhausts() {
        let refiner = ScriptedRefiner::always_reject();

        let result = ConvergenceLoop::new(3)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap();

        assert_eq!(result.item, "Q0");
        assert_eq!(result.outcome, LoopOutcome::Exhausted);
        assert_eq!(result.last_reason.as_deref(), Some("R"));
        assert_eq!(refiner.evaluate_calls().len(), 3);
        assert_eq!(refiner.revise_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_reject_then_accept_returns_revision() {
        let refiner = ScriptedRefiner::new(
            vec![Ok(Verdict::Reject("R".to_string())), Ok(Verdict::Accept)],
            vec!["Q1"],
        );

        let result = ConvergenceLoop::new(3)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap();

        assert_eq!(result.item, "Q1");
        assert_eq!(result.outcome, LoopOutcome::Accepted);
        assert_eq!(result.attempts, 2);
        assert_eq!(refiner.evaluate_calls(), vec!["Q0", "Q1"]);
        assert_eq!(
            refiner.revise_calls(),
            vec![("Q0".to_string(), "R".to_string())]
        );
    }

    #[tokio::test]
    async fn test_exhausted_returns_last_revision_not_revised_again() {
        let refiner = ScriptedRefiner::new(vec![], vec!["Q1", "Q2", "Q3"]);

        let result = ConvergenceLoop::new(3)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap();

        assert_eq!(result.item, "Q2");
        assert_eq!(result.revisions, 2);
        assert_eq!(refiner.evaluate_calls(), vec!["Q0", "Q1", "Q2"]);
    }

    #[tokio::test]
    async fn test_call_counts_bounded_for_each_budget() {
        for k in 1..=5u32 {
            let refiner = ScriptedRefiner::always_reject();
            let result = ConvergenceLoop::new(k)
                .run("Q0".to_string(), &refiner)
                .await
                .unwrap();

            assert_eq!(result.attempts, k);
            assert_eq!(refiner.evaluate_calls().len() as u32, k);
            assert_eq!(refiner.revise_calls().len() as u32, k - 1);
        }
    }

    #[tokio::test]
    async fn test_single_attempt_returns_original() {
        let refiner = ScriptedRefiner::new(vec![], vec!["Q1"]);

        let result = ConvergenceLoop::new(1)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap();

        assert_eq!(result.item, "Q0");
        assert_eq!(result.outcome, LoopOutcome::Exhausted);
        assert!(refiner.revise_calls().is_empty());
    }

    #[test]
    fn test_zero_budget_clamped_to_one() {
        assert_eq!(ConvergenceLoop::new(0).max_attempts(), 1);
        assert_eq!(ConvergenceLoop::default().max_attempts(), 3);
    }

    #[tokio::test]
    async fn test_evaluate_error_propagates() {
        let refiner = ScriptedRefiner::new(
            vec![
                Ok(Verdict::Reject("R".to_string())),
                Err(LlmError::GeneratorUnavailable {
                    attempts: 3,
                    last_error: "连接超时".to_string(),
                }
                .into()),
            ],
            vec!["Q1"],
        );

        let err = ConvergenceLoop::new(3)
            .run("Q0".to_string(), &refiner)
            .await
            .unwrap_err();

        assert!(err.is_generator_unavailable());
        assert_eq!(refiner.evaluate_calls().len(), 2);
    }
}
