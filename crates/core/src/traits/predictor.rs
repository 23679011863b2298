use crate::PortalResult;

/// 预训练回归模型
pub trait Predictor: Send + Sync {
    /// 模型期望的特征数量
    fn feature_count(&self) -> usize;

    fn predict(&self, features: &[f64]) -> PortalResult<f64>;
}
