use ducktherapy::config::{ConfigError, ConfigStore, Settings};
use std::fs;
use tempfile::tempdir;

const MINIMAL_AGENTS: &str = r#"
agents:
  greeter_agent:
    role: 问候者
    goal: 跟用户打招呼
    backstory: 一个友好的问候者。
"#;

const MINIMAL_TASKS: &str = r#"
task_templates:
  greeting_task:
    description: "向用户问好：{user_message}"
    expected_output: 一句问候
    agent: greeter_agent
workflows:
  greeting_flow:
    description: 单步问候流程
    steps:
      - greeting_task
"#;

fn write_pair(agents: &str, tasks: &str) -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("agents.yaml"), agents).unwrap();
    fs::write(dir.path().join("tasks.yaml"), tasks).unwrap();
    dir
}

#[test]
fn minimal_yaml_pair_loads_and_resolves() {
    let dir = write_pair(MINIMAL_AGENTS, MINIMAL_TASKS);
    let config = ConfigStore::load(dir.path(), Settings::default()).unwrap();

    assert_eq!(config.agent_config("greeter_agent").unwrap().role, "问候者");
    assert_eq!(config.task_template("greeting_task").unwrap().agent, "greeter_agent");
    assert_eq!(config.workflow("greeting_flow").unwrap().steps, vec!["greeting_task"]);

    match config.workflow("missing_flow") {
        Err(ConfigError::Missing { kind, name }) => {
            assert_eq!(kind, "workflow");
            assert_eq!(name, "missing_flow");
        }
        other => panic!("expected Missing, got {:?}", other.map(|w| w.description.clone())),
    }
}

#[test]
fn workflow_referencing_an_unknown_task_is_rejected() {
    let tasks = r#"
task_templates:
  greeting_task:
    description: "向用户问好：{user_message}"
    expected_output: 一句问候
    agent: greeter_agent
workflows:
  greeting_flow:
    description: 引用了不存在的任务
    steps:
      - missing_task
"#;
    let dir = write_pair(MINIMAL_AGENTS, tasks);
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("missing_task")),
        other => panic!("expected Invalid, got {:?}", other.err()),
    }
}

#[test]
fn task_referencing_an_unknown_agent_is_rejected() {
    let tasks = r#"
task_templates:
  greeting_task:
    description: "向用户问好：{user_message}"
    expected_output: 一句问候
    agent: ghost_agent
workflows:
  greeting_flow:
    description: 任务指向了不存在的执行者
    steps:
      - greeting_task
"#;
    let dir = write_pair(MINIMAL_AGENTS, tasks);
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("ghost_agent")),
        other => panic!("expected Invalid, got {:?}", other.err()),
    }
}

#[test]
fn emotion_task_must_carry_the_user_message_placeholder() {
    let tasks = r#"
task_templates:
  emotion_analysis_task:
    description: 分析一下情绪
    expected_output: 一份情绪报告
    agent: greeter_agent
workflows:
  greeting_flow:
    description: 单步流程
    steps:
      - emotion_analysis_task
"#;
    let dir = write_pair(MINIMAL_AGENTS, tasks);
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("{user_message}")),
        other => panic!("expected Invalid, got {:?}", other.err()),
    }
}

#[test]
fn listener_agent_requires_emotion_rules() {
    let agents = r#"
agents:
  listener_agent:
    role: 倾听者
    goal: 理解用户的情绪
    backstory: 一个温柔的倾听者。
"#;
    let tasks = r#"
task_templates:
  greeting_task:
    description: "向用户问好：{user_message}"
    expected_output: 一句问候
    agent: listener_agent
workflows:
  greeting_flow:
    description: 单步问候流程
    steps:
      - greeting_task
"#;
    let dir = write_pair(agents, tasks);
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("emotion_rules")),
        other => panic!("expected Invalid, got {:?}", other.err()),
    }
}

#[test]
fn missing_files_surface_as_io_errors() {
    let dir = tempdir().unwrap();
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Io(_)) => {}
        other => panic!("expected Io, got {:?}", other.err()),
    }
}

#[test]
fn malformed_yaml_surfaces_as_a_parse_error() {
    let dir = write_pair("agents: [not, a, map", MINIMAL_TASKS);
    match ConfigStore::load(dir.path(), Settings::default()) {
        Err(ConfigError::Parse(_)) => {}
        other => panic!("expected Parse, got {:?}", other.err()),
    }
}
