//! 辖区（Partition）
//!
//! 每个辖区是一个独立的会话托管域。本 crate 只把它们当作有序的探测列表：
//! 默认辖区永远排第一，其后是配置中按固定顺序给出的命名辖区。

use std::fmt;

use crate::config::SessionsSection;

/// 会话查找域：默认辖区或某个命名辖区（如 `eu`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partition {
    Default,
    Jurisdiction(String),
}

impl Partition {
    pub fn jurisdiction(name: impl Into<String>) -> Self {
        Partition::Jurisdiction(name.into())
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Partition::Default)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Default => f.write_str("default"),
            Partition::Jurisdiction(name) => write!(f, "jurisdiction:{}", name),
        }
    }
}

/// 有序、有限的探测列表，第一个元素总是 `Partition::Default`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOrder {
    partitions: Vec<Partition>,
}

impl PartitionOrder {
    /// 默认辖区 + 给定命名辖区（空名与重复项被忽略）
    pub fn new<I, S>(jurisdictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut partitions = vec![Partition::Default];
        for name in jurisdictions {
            let name = name.into();
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let partition = Partition::jurisdiction(name);
            if !partitions.contains(&partition) {
                partitions.push(partition);
            }
        }
        Self { partitions }
    }

    /// 仅默认辖区
    pub fn default_only() -> Self {
        Self {
            partitions: vec![Partition::Default],
        }
    }

    pub fn from_config(section: &SessionsSection) -> Self {
        Self::new(section.jurisdictions.iter().cloned())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

impl Default for PartitionOrder {
    fn default() -> Self {
        Self::default_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_partition_always_first() {
        let order = PartitionOrder::new(["eu", "fedramp"]);
        let all: Vec<_> = order.iter().cloned().collect();
        assert_eq!(
            all,
            vec![
                Partition::Default,
                Partition::jurisdiction("eu"),
                Partition::jurisdiction("fedramp"),
            ]
        );
    }

    #[test]
    fn test_blank_and_duplicate_jurisdictions_ignored() {
        let order = PartitionOrder::new(["eu", " ", "eu", ""]);
        assert_eq!(order.len(), 2);
        assert!(order.iter().next().is_some_and(Partition::is_default));
        assert!(!Partition::jurisdiction("eu").is_default());
    }

    #[test]
    fn test_display() {
        assert_eq!(Partition::Default.to_string(), "default");
        assert_eq!(Partition::jurisdiction("eu").to_string(), "jurisdiction:eu");
    }
}
