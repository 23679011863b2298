use std::fs;
use std::path::Path;

use portal_core::{PortalError, PortalResult, Predictor};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 预训练线性回归模型
///
/// 模型文件为JSON：`{"coefficients": [..], "intercept": 0.0}`，
/// 进程启动时加载一次，之后只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> PortalResult<Self> {
        let model = Self {
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// 从JSON文件加载模型
    pub fn load(path: impl AsRef<Path>) -> PortalResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PortalError::Prediction(format!("读取模型文件失败 {}: {e}", path.display()))
        })?;

        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;

        info!(
            "回归模型已加载: {} (特征数: {})",
            path.display(),
            model.coefficients.len()
        );
        Ok(model)
    }

    fn validate(&self) -> PortalResult<()> {
        if self.coefficients.is_empty() {
            return Err(PortalError::Prediction("模型系数不能为空".to_string()));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PortalError::Prediction("模型参数必须是有限数值".to_string()));
        }
        Ok(())
    }
}

impl Predictor for LinearRegressionModel {
    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> PortalResult<f64> {
        if features.len() != self.coefficients.len() {
            return Err(PortalError::InvalidInput(format!(
                "特征数量不匹配: 期望 {}，实际 {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        if features.iter().any(|f| !f.is_finite()) {
            return Err(PortalError::InvalidInput("特征必须是有限数值".to_string()));
        }

        Ok(self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x))
    }
}
