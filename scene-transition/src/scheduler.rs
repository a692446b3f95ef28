//! # Scheduler 模块
//!
//! 帧驱动的定时任务。任务归属某个节点，间隔到期后由 `tick` 报告，
//! 由宿主按归属节点分发。
//!
//! 在某次 `tick` 期间或之后注册的任务，第一次被 `tick` 看到时只"就绪"
//! 不触发，因此间隔为 0 的一次性任务恰好在注册后的下一帧触发。

use tracing::trace;

use crate::graph::NodeId;

/// 任务标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

/// 到期的任务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTask {
    pub id: TaskId,
    pub owner: NodeId,
}

#[derive(Debug)]
struct Task {
    id: TaskId,
    owner: NodeId,
    interval: f32,
    elapsed: f32,
    repeat: bool,
    armed: bool,
}

/// 调度器
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_task_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    /// 注册任务
    ///
    /// # 参数
    /// - `owner`: 归属节点
    /// - `interval`: 间隔（秒），负数按 0 处理
    /// - `repeat`: 是否重复触发
    pub fn schedule(&mut self, owner: NodeId, interval: f32, repeat: bool) -> TaskId {
        let id = self.next_task_id();
        self.tasks.push(Task {
            id,
            owner,
            interval: interval.max(0.0),
            elapsed: 0.0,
            repeat,
            armed: false,
        });
        trace!(task = %id, owner = %owner, interval, repeat, "Task scheduled");
        id
    }

    /// 注册一次性任务
    pub fn schedule_once(&mut self, owner: NodeId, interval: f32) -> TaskId {
        self.schedule(owner, interval, false)
    }

    /// 取消任务
    pub fn unschedule(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// 取消节点的所有任务
    pub fn unschedule_all_for(&mut self, owner: NodeId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// 任务数量
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 推进时间，返回本帧到期的任务（按注册顺序）
    pub fn tick(&mut self, dt: f32) -> Vec<FiredTask> {
        let mut fired = Vec::new();
        for task in &mut self.tasks {
            if !task.armed {
                task.armed = true;
                continue;
            }
            task.elapsed += dt;
            if task.elapsed >= task.interval {
                fired.push(FiredTask {
                    id: task.id,
                    owner: task.owner,
                });
                task.elapsed = if task.interval > 0.0 {
                    task.elapsed - task.interval
                } else {
                    0.0
                };
            }
        }

        // 一次性任务触发后移除
        let finished: Vec<TaskId> = fired.iter().map(|f| f.id).collect();
        self.tasks
            .retain(|t| t.repeat || !finished.contains(&t.id));
        fired
    }
}
