use pricebands_core::PipelineError;

pub fn render_error(error: &PipelineError) -> String {
    let opener = if error.is_user_fixable() {
        "Something went wrong, but it's easy to fix."
    } else {
        "Something went wrong."
    };
    let mut lines = vec![
        opener.to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
        String::new(),
        "What to do next:".to_string(),
    ];

    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}
