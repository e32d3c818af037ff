use crate::Tool;

use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(
    title = "calculator",
    description = "Performs basic arithmetic operations: add, subtract, multiply, divide"
)]
pub struct Calculator {
    // decoded as a plain string so an unknown value is reported as such,
    // not as malformed input
    #[schemars(with = "Operation", description = "The arithmetic operation to perform")]
    pub operation: String,

    #[schemars(description = "The first operand")]
    pub a: f64,

    #[schemars(description = "The second operand")]
    pub b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[schemars(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Error, PartialEq)]
pub enum CalculatorError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("division by zero")]
    DivisionByZero,
}

impl FromStr for Operation {
    type Err = CalculatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Operation::Add),
            "subtract" => Ok(Operation::Subtract),
            "multiply" => Ok(Operation::Multiply),
            "divide" => Ok(Operation::Divide),
            other => Err(CalculatorError::UnknownOperation(other.to_string())),
        }
    }
}

impl Calculator {
    pub fn evaluate(&self) -> Result<f64, CalculatorError> {
        let result = match self.operation.parse::<Operation>()? {
            Operation::Add => self.a + self.b,
            Operation::Subtract => self.a - self.b,
            Operation::Multiply => self.a * self.b,
            Operation::Divide => {
                if self.b == 0.0 {
                    return Err(CalculatorError::DivisionByZero);
                }
                self.a / self.b
            }
        };
        Ok(result)
    }
}

impl Tool for Calculator {
    fn apply(&self) -> Result<String> {
        tracing::debug!(
            operation = %self.operation,
            a = self.a,
            b = self.b,
            "calculator called"
        );
        let result = self.evaluate()?;
        Ok(format!("{result:.2}"))
    }
}
