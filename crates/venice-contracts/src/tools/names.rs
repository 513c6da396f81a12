use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GenerateVeniceImage,
    ApproveImage,
    RegenerateImage,
    ListAvailableModels,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::GenerateVeniceImage,
        ToolName::ApproveImage,
        ToolName::RegenerateImage,
        ToolName::ListAvailableModels,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateVeniceImage => "generate_venice_image",
            Self::ApproveImage => "approve_image",
            Self::RegenerateImage => "regenerate_image",
            Self::ListAvailableModels => "list_available_models",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
