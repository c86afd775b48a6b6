use std::fmt;

#[derive(Debug, Clone)]
pub enum GeoStampError {
    Configuration(String),
    LookupSource(String),
}

impl GeoStampError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoStampError::Configuration(_) => "E001",
            GeoStampError::LookupSource(_) => "E002",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoStampError::Configuration(_) => "Configuration Error",
            GeoStampError::LookupSource(_) => "Lookup Source Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeoStampError::Configuration(msg) => msg,
            GeoStampError::LookupSource(msg) => msg,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoStampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoStampError {}

// 便捷的构造函数
impl GeoStampError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        GeoStampError::Configuration(msg.into())
    }

    pub fn lookup_source<T: Into<String>>(msg: T) -> Self {
        GeoStampError::LookupSource(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GeoStampError>;
