use thiserror::Error;

#[derive(Error, Debug, Eq, PartialEq)]
pub enum IterErr {
    /// 链式调用或带谓词的消费操作收到非函数参数。
    /// 属于结构性错误，在调用处立即抛出，绝不延迟到拉取阶段。
    #[error("[Invalid Argument] `{op}` expects a {expected}, got `{got}`")]
    InvalidArgument { op: &'static str, expected: &'static str, got: &'static str },
}
