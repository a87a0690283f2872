/// Operator console served by `vsm-console serve-web`.
///
/// The page only gathers field values; every decision is made by the
/// controllers behind `/api/*`, which answer with a UI effect.
pub fn app_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>VSM Console</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 1.5rem; background: #fafafa; }
        main { max-width: 960px; margin: 0 auto; }
        section { background: #fff; border: 1px solid #ddd; border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
        h1, h2 { margin-top: 0; }
        label { display: block; margin: 0.4rem 0 0.2rem; font-weight: 600; }
        input, textarea, select, button { font: inherit; }
        input, textarea, select { width: 100%; padding: 0.5rem; border: 1px solid #ccc; border-radius: 6px; box-sizing: border-box; }
        textarea { min-height: 160px; font-family: ui-monospace, monospace; }
        .row { display: grid; grid-template-columns: 1fr 1fr; gap: 0.75rem; }
        .actions { margin-top: 0.6rem; display: flex; gap: 0.5rem; flex-wrap: wrap; }
        button { padding: 0.5rem 0.8rem; border: 1px solid #888; border-radius: 6px; background: #f5f5f5; cursor: pointer; }
        pre { background: #111; color: #f2f2f2; padding: 0.8rem; border-radius: 6px; overflow: auto; }
        .tip-error { color: #b00020; font-weight: 600; }
        .tip-warning { color: #a05a00; font-weight: 600; }
        #busy { visibility: hidden; color: #555; }
        .muted { color: #666; font-size: 0.92rem; }
    </style>
</head>
<body>
    <main>
        <h1>VSM Console <span id="busy">working...</span></h1>
        <p id="tip"></p>
        <input type="hidden" id="csrf-token" value="" />

        <section>
            <h2>Rename Pool</h2>
            <div class="row">
                <div>
                    <label for="pool-id">Pool ID</label>
                    <input id="pool-id" placeholder="3" />
                </div>
                <div>
                    <label for="new-name">New name *</label>
                    <input id="new-name" placeholder="gold" />
                </div>
            </div>
            <div class="actions"><button onclick="renamePool()">Rename</button></div>
        </section>

        <section>
            <h2>Server Actions</h2>
            <div class="row">
                <div>
                    <label for="mode">Mode</label>
                    <select id="mode">
                        <option value="">(resolve from title)</option>
                        <option value="add_servers">Add Servers</option>
                        <option value="remove_servers">Remove Servers</option>
                        <option value="add_monitors">Add Monitors</option>
                        <option value="remove_monitors">Remove Monitors</option>
                        <option value="start_servers">Start Servers</option>
                        <option value="stop_servers">Stop Servers</option>
                        <option value="ceph_upgrade">Ceph Upgrade</option>
                    </select>
                </div>
                <div>
                    <label for="title">Title</label>
                    <input id="title" placeholder="Remove Servers" />
                </div>
            </div>
            <label for="rows">Rows</label>
            <p class="muted">JSON array of rows, e.g. {"row_id": "r1", "id": "1", "selected": true, "monitor_tag": "yes", "remove_storage": true}</p>
            <textarea id="rows">[]</textarea>
            <div class="row">
                <div>
                    <label for="package-url">Package URL</label>
                    <input id="package-url" />
                </div>
                <div>
                    <label for="key-url">Key URL</label>
                    <input id="key-url" />
                </div>
            </div>
            <div class="actions">
                <button onclick="resolveAction()">Resolve</button>
                <button onclick="submitServers()">Submit</button>
                <button onclick="cephUpgrade()">Ceph Upgrade</button>
            </div>
        </section>

        <section>
            <h2>Reset Server Status</h2>
            <label for="reset-server-id">Server ID</label>
            <input id="reset-server-id" placeholder="12" />
            <div class="actions"><button onclick="resetStatus()">Reset</button></div>
        </section>

        <section>
            <h2>Install Server</h2>
            <div class="row">
                <div>
                    <label for="server-ip">Server IP</label>
                    <input id="server-ip" placeholder="10.0.0.5" />
                </div>
                <div>
                    <label for="ssh-user-name">SSH user name</label>
                    <input id="ssh-user-name" placeholder="cephuser" />
                </div>
            </div>
            <div class="actions"><button onclick="installServer()">Install</button></div>
        </section>

        <pre id="status-output">(no data yet)</pre>
    </main>

    <script>
        let inFlight = 0;
        let dashboardBusy = false;

        function renderBusy() {
            const busy = inFlight > 0 || dashboardBusy;
            document.getElementById('busy').style.visibility = busy ? 'visible' : 'hidden';
        }

        // Rejections from the console (e.g. a 422 for a malformed body) are plain text.
        async function readPayload(response) {
            const text = await response.text();
            try {
                return JSON.parse(text);
            } catch (_) {
                return { error: text || response.statusText };
            }
        }

        async function fetchJson(url, options) {
            inFlight += 1;
            renderBusy();
            try {
                const response = await fetch(url, options);
                const payload = await readPayload(response);
                if (!response.ok) {
                    throw new Error(payload.error || JSON.stringify(payload));
                }
                return payload;
            } finally {
                inFlight -= 1;
                renderBusy();
            }
        }

        // Requests started by other tabs or the CLI share the server-side flag.
        async function pollBusy() {
            try {
                const response = await fetch('/api/busy');
                const payload = await readPayload(response);
                dashboardBusy = response.ok && payload.busy === true;
            } catch (_) {
                dashboardBusy = false;
            }
            renderBusy();
        }

        setInterval(pollBusy, 500);

        function postJson(url, body) {
            return fetchJson(url, {
                method: 'POST',
                headers: { 'content-type': 'application/json' },
                body: JSON.stringify(body)
            });
        }

        function value(id) {
            return document.getElementById(id).value;
        }

        function show(payload) {
            document.getElementById('status-output').textContent = JSON.stringify(payload, null, 2);
        }

        function showTip(level, message) {
            const tip = document.getElementById('tip');
            tip.className = 'tip-' + level;
            tip.textContent = message;
        }

        function apply(effect) {
            show(effect);
            if (effect.effect === 'navigate') {
                window.location.href = effect.url;
            } else if (effect.effect === 'show_tip') {
                showTip(effect.level, effect.message);
            } else {
                showTip('', '');
            }
        }

        async function run(promise) {
            try {
                apply(await promise);
            } catch (err) {
                showTip('error', err.message);
            }
        }

        function serverPage() {
            const page = {
                title: value('title'),
                csrf_token: value('csrf-token'),
                rows: JSON.parse(value('rows') || '[]'),
                package_url: value('package-url'),
                key_url: value('key-url')
            };
            if (value('mode')) page.mode = value('mode');
            return page;
        }

        function renamePool() {
            run(postJson('/api/pools/rename', {
                pool_id: value('pool-id'),
                new_name: value('new-name'),
                csrf_token: value('csrf-token')
            }));
        }

        async function resolveAction() {
            try { show(await postJson('/api/actions/resolve', { label: value('title') })); }
            catch (err) { showTip('error', err.message); }
        }

        function submitServers() {
            try { run(postJson('/api/servers/submit', serverPage())); }
            catch (err) { showTip('error', 'rows are not valid JSON: ' + err.message); }
        }

        function cephUpgrade() {
            try { run(postJson('/api/servers/ceph-upgrade', serverPage())); }
            catch (err) { showTip('error', 'rows are not valid JSON: ' + err.message); }
        }

        function resetStatus() {
            const serverId = encodeURIComponent(value('reset-server-id'));
            run(postJson('/api/servers/reset-status/' + serverId, { csrf_token: value('csrf-token') }));
        }

        function installServer() {
            run(postJson('/api/servers/install', {
                server_ip: value('server-ip'),
                ssh_user_name: value('ssh-user-name'),
                csrf_token: value('csrf-token')
            }));
        }
    </script>
</body>
</html>
"#
    .to_string()
}
