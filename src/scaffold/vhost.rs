//! Apache virtual host for a new project

use std::path::{Path, PathBuf};

/// Where the apache container picks up vhost files, relative to the stack root
pub const VHOSTS_DIR: &str = "docker/apache/vhosts";

pub fn vhost_path(project_root: &Path, host: &str) -> PathBuf {
    project_root.join(VHOSTS_DIR).join(format!("{}.conf", host))
}

/// PHP requests go to the FPM service `php:9000`
pub fn render(project: &str, host: &str, container_source_dir: &str) -> String {
    let docroot = format!("{}/{}/public", container_source_dir.trim_end_matches('/'), project);
    format!(
        r#"<VirtualHost *:80>
    ServerName {host}

    DocumentRoot {docroot}

    <Directory {docroot}>
        AllowOverride All
        Require all granted
        DirectoryIndex index.php index.html
    </Directory>

    <FilesMatch \.php$>
        SetHandler "proxy:fcgi://php:9000"
    </FilesMatch>
</VirtualHost>
"#
    )
}
