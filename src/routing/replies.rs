//! Static reply texts.

pub const WELCOME: &str = "\
🤖 *GrassBot Control Panel*

*Available Commands:*
/start - Show this message
/status - Check bot status
/start\\_farming - Start farming process
/stop\\_farming - Stop farming process
/update\\_proxies - Update proxy list
/update\\_config - Update configuration
/view\\_config - View current configuration
/view\\_proxies - View current proxies
/restart - Restart the worker
/help - Show detailed help

*Quick Setup:*
1. Add your proxy list to proxy.txt or use /update\\_proxies
2. Configure your user IDs in config.json or use /update\\_config
3. Start farming with /start\\_farming

Send JSON configuration directly to update config.";

pub const HELP: &str = "\
📖 *Help*

*Worker control*
/status - Users, proxies and worker state
/start\\_farming - Start the worker
/stop\\_farming - Stop the worker
/restart - Stop and start the worker again

*Proxies*
/update\\_proxies http://proxy1:port http://proxy2:port
Or reply to a message listing one proxy per line with /update\\_proxies
/view\\_proxies - Show the stored list

*Configuration*
/update\\_config {\"user\\_ids\": [\"id1\", \"id2\"]}
Or reply to a message holding the JSON with /update\\_config
Or send a JSON object with a user\\_ids field as a plain message
/view\\_config - Show the stored configuration

Updates replace top-level keys and keep the rest.";

pub const UPDATE_PROXIES_USAGE: &str = "\
📋 *How to update proxies:*

*Option 1: Command arguments*
`/update_proxies http://proxy1:port http://proxy2:port`

*Option 2: Reply to a message*
1. Send your proxy list (one per line)
2. Reply to that message with `/update_proxies`";

pub const UPDATE_CONFIG_USAGE: &str = "\
Please provide JSON config. Example:
`/update_config {\"user_ids\": [\"id1\", \"id2\"]}`

You can also reply to a message holding the JSON with `/update_config`.";

pub const NO_PROXIES: &str = "📋 No proxies configured";
