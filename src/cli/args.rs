use clap::Parser;

/// Every input comes from `PLUGIN_*` environment variables set by the CI
/// runner; the flags exist for running the plugin by hand.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "esa-cert-rotator")]
#[command(version)]
#[command(about = "Replace the TLS certificate of an Alibaba Cloud ESA site")]
#[command(long_about = None)]
pub struct Cli {
    /// Path to the PEM certificate to upload
    #[arg(long, env = "PLUGIN_PUBLIC_KEY", default_value = "", hide_default_value = true)]
    pub public_key: String,

    /// Path to the PEM private key to upload
    #[arg(long, env = "PLUGIN_PRIVATE_KEY", default_value = "", hide_default_value = true)]
    pub private_key: String,

    /// Domain whose certificate is rotated
    #[arg(long, env = "PLUGIN_DOMAIN_NAME", default_value = "", hide_default_value = true)]
    pub domain_name: String,

    /// Numeric ESA site id
    #[arg(long, env = "PLUGIN_SITE_ID", default_value = "", hide_default_value = true)]
    pub site_id: String,

    /// Access key id; leave both key fields empty to use ambient credentials
    #[arg(
        long,
        env = "PLUGIN_ACCESS_KEY_ID",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub access_key_id: String,

    /// Access key secret
    #[arg(
        long,
        env = "PLUGIN_ACCESS_KEY_SECRET",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true
    )]
    pub access_key_secret: String,

    /// ESA API endpoint [default: esa.cn-hangzhou.aliyuncs.com]
    #[arg(long, env = "PLUGIN_ENDPOINT", default_value = "", hide_default_value = true)]
    pub endpoint: String,

    /// Certificate type tag sent with the upload [default: upload]
    #[arg(long, env = "PLUGIN_CERT_TYPE", default_value = "", hide_default_value = true)]
    pub cert_type: String,

    /// Enable debug logging
    #[arg(long, env = "PLUGIN_DEBUG")]
    pub debug: bool,

    /// Enable verbose logging (repeat for more verbosity: -v DEBUG, -vv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
