use crate::err::IterErr;
use crate::source::Source;
use crate::stage::{Stage, StageOut};
use crate::table::Table;
use crate::value::{Value, expect_func};
use crate::{IterRes, Row};

/// 惰性迭代流水线。
///
/// 构造与链式调用不读取任何源元素，只向阶段序列排队；
/// 全部求值发生在next拉取中，消费操作全部基于重复next构建。
/// 一条流水线只有一个逻辑游标，由所有权保证不被并发推进。
#[derive(Debug)]
pub struct Iter {
    source: Source,
    stages: Vec<Stage>,
    mutable: bool,
    halted: bool,
}

impl Iter {
    pub(crate) fn new(source: Source) -> Iter {
        Iter { source, stages: Vec::new(), mutable: false, halted: false }
    }

    /* **************************************** 链式操作 **************************************** */

    /// 排队一个映射阶段。transformer必须为函数值，否则立即报错。
    pub fn map(mut self, transformer: Value) -> IterRes {
        self.stages.push(Stage::Map(expect_func("map", transformer)?));
        Ok(self)
    }

    /// 排队一个过滤阶段。predicate必须为函数值，否则立即报错。
    pub fn filter(mut self, predicate: Value) -> IterRes {
        self.stages.push(Stage::Filter(expect_func("filter", predicate)?));
        Ok(self)
    }

    /// 排队一个截断映射阶段：变换结果为nil时整条流水线耗尽。
    /// transformer必须为函数值，否则立即报错。
    pub fn map_while(mut self, transformer: Value) -> IterRes {
        self.stages.push(Stage::MapWhile(expect_func("map_while", transformer)?));
        Ok(self)
    }

    /// 排队一个计数阶段，在元组头部前置1起计数。
    pub fn enumerate(mut self) -> Iter {
        self.stages.push(Stage::Enumerate { count: 0 });
        self
    }

    /// 排队一个限量阶段，保留前n个到达的元素。
    pub fn take(mut self, n: usize) -> Iter {
        self.stages.push(Stage::Take { remaining: n });
        self
    }

    /// 标记结果可变：collect/collect_array不再冻结结果表。
    /// 纯结果策略，不影响迭代语义。
    #[allow(clippy::wrong_self_convention)]
    pub fn as_mut(mut self) -> Iter {
        self.mutable = true;
        self
    }

    /* **************************************** 拉取 **************************************** */

    /// 推进流水线，产出下一个值元组；耗尽后稳定产出None。
    ///
    /// 唯一执行工作的入口：原始元素逐阶段求值，被filter丢弃的元素
    /// 触发重新拉取，mapWhile或take触发的耗尽是粘性的。
    /// take配额用尽时在拉取开始前短路，上游阶段不做任何无用功。
    pub fn next(&mut self) -> Option<Row> {
        if self.halted || self.stages.iter().any(Stage::exhausted) {
            self.halted = true;
            return None;
        }
        'pull: loop {
            let mut row = self.source.pull()?;
            for stage in &mut self.stages {
                match stage.apply(row) {
                    StageOut::Pass(passed) => row = passed,
                    StageOut::Skip => continue 'pull,
                    StageOut::Halt => {
                        self.halted = true;
                        return None;
                    }
                }
            }
            return Some(row);
        }
    }

    /* **************************************** 消费操作 **************************************** */

    /// 拉取直到耗尽，按元组形状写入全新结果表；除非asMut，结果默认冻结。
    pub fn collect(mut self) -> Table {
        let mut table = Table::new();
        while let Some(row) = self.next() {
            table.insert_row(row);
        }
        if !self.mutable {
            table.freeze();
        }
        table
    }

    /// 拉取直到耗尽，丢弃键位只保留值位，产出纯数组结果表；除非asMut，结果默认冻结。
    pub fn collect_array(mut self) -> Table {
        let mut table = Table::new();
        while let Some(mut row) = self.next() {
            if let Some(value) = row.pop() {
                table.push(value);
            }
        }
        if !self.mutable {
            table.freeze();
        }
        table
    }

    /// 拉取直到耗尽并计数；即使源为空，next也至少被调用一次。
    pub fn count(mut self) -> usize {
        let mut count = 0;
        while self.next().is_some() {
            count += 1;
        }
        count
    }

    /// 拉取直到耗尽，返回最后一个成功产出的元组；空序列返回None。
    pub fn last(mut self) -> Option<Row> {
        let mut last = None;
        while let Some(row) = self.next() {
            last = Some(row);
        }
        last
    }

    /// 对每个元组应用谓词，遇到假值立即返回false并停止拉取；空序列返回true。
    /// 提前停止后流水线停在触发元素之后，剩余元素仍可继续拉取。
    pub fn all(&mut self, predicate: Value) -> Result<bool, IterErr> {
        let func = expect_func("all", predicate)?;
        while let Some(row) = self.next() {
            if !func.call(&row).truthy() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// 对每个元组应用谓词，遇到真值立即返回true并停止拉取；空序列返回false。
    /// 提前停止后流水线停在触发元素之后，剩余元素仍可继续拉取。
    pub fn any(&mut self, predicate: Value) -> Result<bool, IterErr> {
        let func = expect_func("any", predicate)?;
        while let Some(row) = self.next() {
            if func.call(&row).truthy() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 拉取直到耗尽，对每个产出的元组调用f；回调无法中断迭代。
    pub fn for_each(mut self, f: Value) -> Result<(), IterErr> {
        let func = expect_func("for_each", f)?;
        while let Some(row) = self.next() {
            func.call(&row);
        }
        Ok(())
    }
}

impl Iterator for Iter {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        Iter::next(self)
    }
}
