//! Make the Vite dev server reachable from outside the node container

const SERVER_BLOCK: &str = "\tserver: {\n\t\thost: '0.0.0.0'\n\t}\n});";

/// Insert a `server.host` block before the final `});` of
/// `vite.config.js`. Returns `None` when already patched or when there is
/// no closing `});` to anchor on.
pub fn patch_config(contents: &str) -> Option<String> {
    if contents.contains("host: '0.0.0.0'") {
        return None;
    }
    let idx = contents.rfind("});")?;
    let mut patched = String::with_capacity(contents.len() + SERVER_BLOCK.len());
    patched.push_str(&contents[..idx]);
    patched.push_str(SERVER_BLOCK);
    patched.push_str(&contents[idx + "});".len()..]);
    Some(patched)
}
