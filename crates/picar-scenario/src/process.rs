//! 进程控制抽象
//!
//! 每个阶段运行在独立的操作系统进程中：阶段崩溃不会破坏其他阶段的进程内状态。
//! 编排器只通过 [`ProcessControl`] 操作进程，测试中可以替换为虚拟实现。

use std::fmt;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ScenarioError;

/// 一个阶段的启动描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// `None` 表示一直等到阶段自行结束
    pub timeout: Option<Duration>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 可读的命令行（日志 / dry-run 用）
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// 进程退出信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// 退出码（被信号终止时为 `None`）
    pub code: Option<i32>,
    /// 终止信号（仅 Unix）
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// 等待结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Exited(ExitInfo),
    /// 在给定时间内没有退出
    TimedOut,
}

/// 进程控制接口
pub trait ProcessControl {
    type Handle;

    fn spawn(&mut self, stage: &StageSpec) -> Result<Self::Handle, ScenarioError>;

    /// 等待进程退出；`timeout = None` 时一直阻塞
    fn wait(
        &mut self,
        handle: &mut Self::Handle,
        timeout: Option<Duration>,
    ) -> Result<WaitStatus, ScenarioError>;

    /// 请求优雅退出
    fn terminate(&mut self, handle: &mut Self::Handle) -> Result<(), ScenarioError>;

    /// 强制结束
    fn kill(&mut self, handle: &mut Self::Handle) -> Result<(), ScenarioError>;
}

/// 基于 `std::process` 的实现
///
/// 优雅退出在 Unix 上发送 `SIGTERM`（阶段进程的 Ctrl+C 处理器会先回到安全姿态），
/// 其他平台直接强制结束。
#[derive(Debug, Clone)]
pub struct OsProcessControl {
    poll_interval: Duration,
}

impl OsProcessControl {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for OsProcessControl {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

impl ProcessControl for OsProcessControl {
    type Handle = Child;

    fn spawn(&mut self, stage: &StageSpec) -> Result<Child, ScenarioError> {
        debug!("spawn: {}", stage.command_line());
        Command::new(&stage.program)
            .args(&stage.args)
            .spawn()
            .map_err(|source| ScenarioError::Spawn {
                stage: stage.name.clone(),
                source,
            })
    }

    fn wait(
        &mut self,
        child: &mut Child,
        timeout: Option<Duration>,
    ) -> Result<WaitStatus, ScenarioError> {
        let Some(timeout) = timeout else {
            return Ok(WaitStatus::Exited(child.wait()?.into()));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(WaitStatus::Exited(status.into()));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitStatus::TimedOut);
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self, child: &mut Child) -> Result<(), ScenarioError> {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid = child.id();
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ScenarioError::Signal {
                pid,
                reason: e.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self, child: &mut Child) -> Result<(), ScenarioError> {
        self.kill(child)
    }

    fn kill(&mut self, child: &mut Child) -> Result<(), ScenarioError> {
        child.kill().map_err(|e| ScenarioError::Signal {
            pid: child.id(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_spec_builder() {
        let stage = StageSpec::new("turn-left", "/usr/bin/picar-cli")
            .args(["turn", "left"])
            .timeout(Some(Duration::from_millis(1500)));
        assert_eq!(stage.command_line(), "/usr/bin/picar-cli turn left");
        assert_eq!(stage.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_exit_info_display() {
        let ok = ExitInfo {
            code: Some(0),
            signal: None,
        };
        assert!(ok.success());
        assert_eq!(ok.to_string(), "exit code 0");

        let killed = ExitInfo {
            code: None,
            signal: Some(9),
        };
        assert!(!killed.success());
        assert_eq!(killed.to_string(), "signal 9");
    }
}
