pub type CmdResult<T> = rebrand::Result<(T, i32)>;

pub mod patch;
