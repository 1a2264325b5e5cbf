//! Oxide `RustPlugin` source generation.
//!
//! The generated class opens a centered overlay sized to the design and
//! attaches one CUI element per [`Element`]. Elements without an anchor
//! (their parent has no area) are skipped together with their descendants.
//!
//! In [`AssetMode::Data`] the image source of a raw image is an asset key.
//! The plugin then loads `<data>/<Class>/Images/<key>.png` into server file
//! storage on startup and references the stored PNG ids.

use std::fmt::Write;

use serde::Serialize;

use crate::naming::{escape_csharp, sanitize_name, to_pascal_case, IdAllocator};
use crate::protocol::AssetMode;
use crate::types::{Component, DesignNode, Element};

const FALLBACK_WIDTH: f64 = 1104.0;
const FALLBACK_HEIGHT: f64 = 738.0;
const PLUGIN_VERSION: &str = "1.0.0";

/// A rendered plugin and the names it was rendered under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSource {
    /// `{Name}UI`, also the Oxide plugin title.
    pub class_name: String,
    /// Chat command that toggles the UI.
    pub command: String,
    pub file_name: String,
    pub code: String,
    /// Elements actually declared in `code`.
    pub declared: usize,
}

pub fn render_plugin(
    root: &DesignNode,
    elements: &[Element],
    author: &str,
    assets: AssetMode,
) -> PluginSource {
    let class_name = format!("{}UI", to_pascal_case(&sanitize_name(&root.name)));
    let command = class_name.to_lowercase();
    let width = design_extent(root.width, FALLBACK_WIDTH);
    let height = design_extent(root.height, FALLBACK_HEIGHT);
    let data_assets = assets == AssetMode::Data;

    let mut code = String::new();
    write_header(&mut code, &class_name, author);
    if data_assets {
        write_asset_loader(&mut code, &class_name);
    }
    write_members(&mut code, &class_name, width, height);
    write_commands(&mut code, &command);
    if data_assets {
        write_asset_hooks(&mut code, &class_name, &command, &asset_keys(elements));
    }

    code.push_str("        private void ShowUI(BasePlayer player)\n        {\n");
    code.push_str("            CloseUI(player);\n");
    code.push_str("            playersWithUI.Add(player.userID);\n\n");
    code.push_str("            var elements = new CuiElementContainer();\n");
    code.push_str("            var s = Mathf.Clamp(GetScale(player), MinScale, MaxScale);\n");
    code.push_str("            var halfW = Mathf.RoundToInt(DesignWidth * s / 2f);\n");
    code.push_str("            var halfH = Mathf.RoundToInt(DesignHeight * s / 2f);\n\n");
    if data_assets {
        code.push_str("            if (assets == null) Puts(\"[UI] Assets loader is not initialized yet; images may be missing.\");\n\n");
    }
    code.push_str("            elements.Add(new CuiPanel\n");
    code.push_str("            {\n");
    code.push_str("                Image = { Color = \"0 0 0 0\" },\n");
    code.push_str("                RectTransform = { AnchorMin = \"0.5 0.5\", AnchorMax = \"0.5 0.5\", OffsetMin = $\"{-halfW} {-halfH}\", OffsetMax = $\"{halfW} {halfH}\" },\n");
    code.push_str("                CursorEnabled = true,\n");
    code.push_str("                FadeOut = 0.1f\n");
    code.push_str("            }, \"Overlay\", UIName);\n\n");

    let declared = write_elements(&mut code, elements, assets);

    code.push_str("            CuiHelper.AddUi(player, elements);\n");
    code.push_str("        }\n\n");
    code.push_str("        private void CloseUI(BasePlayer player)\n        {\n");
    code.push_str("            CuiHelper.DestroyUi(player, UIName);\n");
    code.push_str("            playersWithUI.Remove(player.userID);\n");
    code.push_str("        }\n\n");
    code.push_str("        void OnPlayerDisconnected(BasePlayer player) { playersWithUI.Remove(player.userID); }\n\n");
    if data_assets {
        code.push_str("        void Unload() { assets?.Cancel(); foreach (var p in BasePlayer.activePlayerList) CloseUI(p); playersWithUI.Clear(); }\n");
    } else {
        code.push_str("        void Unload() { foreach (var p in BasePlayer.activePlayerList) CloseUI(p); playersWithUI.Clear(); }\n");
    }
    code.push_str("    }\n}\n");

    PluginSource {
        file_name: format!("{class_name}.cs"),
        class_name,
        command,
        code,
        declared,
    }
}

fn design_extent(v: f64, fallback: f64) -> i64 {
    let rounded = v.round();
    if rounded.is_finite() && rounded > 0.0 {
        rounded as i64
    } else {
        fallback as i64
    }
}

fn write_header(code: &mut String, class_name: &str, author: &str) {
    code.push_str("using Oxide.Core;\n");
    code.push_str("using Oxide.Core.Plugins;\n");
    code.push_str("using Oxide.Game.Rust.Cui;\n");
    code.push_str("using System;\n");
    code.push_str("using System.Collections.Generic;\n");
    code.push_str("using System.Globalization;\n");
    code.push_str("using UnityEngine;\n\n");
    code.push_str("namespace Oxide.Plugins\n{\n");
    let _ = writeln!(
        code,
        "    [Info(\"{}\", \"{}\", \"{}\")]",
        class_name,
        escape_csharp(author),
        PLUGIN_VERSION
    );
    code.push_str("    [Description(\"Generated from a design frame\")]\n");
    let _ = writeln!(code, "    class {class_name} : RustPlugin\n    {{");
}

fn write_members(code: &mut String, class_name: &str, width: i64, height: i64) {
    let _ = writeln!(code, "        private const string UIName = \"{class_name}\";");
    code.push_str("        private const float MinScale = 0.5f;\n");
    code.push_str("        private const float MaxScale = 1.5f;\n");
    code.push_str("        private const float DefaultScale = 1.0f;\n");
    let _ = writeln!(code, "        private const float DesignWidth = {width}f;");
    let _ = writeln!(code, "        private const float DesignHeight = {height}f;");
    code.push_str("        private readonly HashSet<ulong> playersWithUI = new HashSet<ulong>();\n");
    code.push_str("        private readonly Dictionary<ulong, float> playerScale = new Dictionary<ulong, float>();\n\n");
    code.push_str("        private float GetScale(BasePlayer player)\n        {\n");
    code.push_str("            float s;\n");
    code.push_str("            if (player != null && playerScale.TryGetValue(player.userID, out s)) return Mathf.Clamp(s, MinScale, MaxScale);\n");
    code.push_str("            return DefaultScale;\n");
    code.push_str("        }\n\n");
    code.push_str("        private bool HasUI(BasePlayer player) { return playersWithUI.Contains(player.userID); }\n\n");
}

fn write_commands(code: &mut String, command: &str) {
    let _ = writeln!(code, "        [ChatCommand(\"{command}\")]");
    code.push_str("        void CmdToggleUI(BasePlayer player, string command, string[] args)\n        {\n");
    code.push_str("            float v;\n");
    code.push_str("            if (args != null && args.Length > 1 && args[0] == \"scale\" && float.TryParse(args[1], NumberStyles.Float, CultureInfo.InvariantCulture, out v))\n");
    code.push_str("            {\n");
    code.push_str("                playerScale[player.userID] = Mathf.Clamp(v, MinScale, MaxScale);\n");
    code.push_str("                ShowUI(player);\n");
    code.push_str("                return;\n");
    code.push_str("            }\n");
    code.push_str("            if (HasUI(player)) CloseUI(player); else ShowUI(player);\n");
    code.push_str("        }\n\n");
}

/// Distinct non-empty image sources, in element order.
fn asset_keys(elements: &[Element]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for el in elements {
        if let Some(Component::RawImage { url, .. }) = el.components.first() {
            if !url.is_empty() && !keys.contains(&url.as_str()) {
                keys.push(url);
            }
        }
    }
    keys
}

fn write_asset_loader(code: &mut String, class_name: &str) {
    code.push_str("        private class UIAssetsLoader\n        {\n");
    code.push_str("            private readonly Dictionary<string, string> _ids = new Dictionary<string, string>();\n");
    code.push_str("            private readonly HashSet<string> _missingLogged = new HashSet<string>();\n");
    code.push_str("            private readonly string _pluginName;\n");
    let _ = writeln!(code, "            private readonly {class_name} _plugin;");
    code.push_str("            private bool _cancel;\n");
    code.push_str("            public int Requested { get; private set; }\n");
    code.push_str("            public int Loaded { get; private set; }\n");
    code.push_str("            public int Failed { get; private set; }\n\n");
    let _ = writeln!(
        code,
        "            public UIAssetsLoader(string pluginName, {class_name} plugin) {{ _pluginName = pluginName; _plugin = plugin; }}"
    );
    code.push_str("            public void StartLoad(IEnumerable<string> keys) { _cancel = false; ServerMgr.Instance.StartCoroutine(LoadRoutine(keys)); }\n");
    code.push_str("            public void Cancel() { _cancel = true; }\n\n");
    code.push_str("            private System.Collections.IEnumerator LoadRoutine(IEnumerable<string> keys)\n            {\n");
    code.push_str("                foreach (var key in keys)\n                {\n");
    code.push_str("                    if (_cancel) yield break;\n");
    code.push_str("                    var path = $\"file://{Interface.Oxide.DataDirectory}/{_pluginName}/Images/{key}.png\";\n");
    code.push_str("                    using (var req = UnityEngine.Networking.UnityWebRequestTexture.GetTexture(path))\n                    {\n");
    code.push_str("                        Requested++;\n");
    code.push_str("                        yield return req.SendWebRequest();\n");
    code.push_str("                        var tex = req.result == UnityEngine.Networking.UnityWebRequest.Result.Success\n");
    code.push_str("                            ? UnityEngine.Networking.DownloadHandlerTexture.GetContent(req)\n");
    code.push_str("                            : null;\n");
    code.push_str("                        if (tex == null)\n                        {\n");
    code.push_str("                            Failed++;\n");
    code.push_str("                            _plugin?.PrintWarning($\"[UIAssets] Not found or failed: '{key}' => {path} ({req.error})\");\n");
    code.push_str("                            continue;\n");
    code.push_str("                        }\n");
    code.push_str("                        var bytes = tex.EncodeToPNG();\n");
    code.push_str("                        _ids[key] = FileStorage.server.Store(bytes, FileStorage.Type.png, CommunityEntity.ServerInstance.net.ID).ToString();\n");
    code.push_str("                        Loaded++;\n");
    code.push_str("                        UnityEngine.Object.DestroyImmediate(tex);\n");
    code.push_str("                    }\n");
    code.push_str("                    yield return null;\n");
    code.push_str("                }\n");
    code.push_str("                _plugin?.Puts($\"[UIAssets] Requested: {Requested}, Loaded: {Loaded}, Failed: {Failed}\");\n");
    code.push_str("            }\n\n");
    code.push_str("            public string Get(string key)\n            {\n");
    code.push_str("                string id;\n");
    code.push_str("                if (_ids.TryGetValue(key, out id)) return id;\n");
    code.push_str("                if (_missingLogged.Add(key)) _plugin?.PrintWarning($\"[UIAssets] No PNG for '{key}'; place it at data/{_pluginName}/Images/{key}.png\");\n");
    code.push_str("                return null;\n");
    code.push_str("            }\n");
    code.push_str("        }\n\n");
    code.push_str("        private UIAssetsLoader assets;\n");
}

fn write_asset_hooks(code: &mut String, class_name: &str, command: &str, keys: &[&str]) {
    let literal = keys
        .iter()
        .map(|k| format!("\"{}\"", escape_csharp(k)))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        code,
        "        private static readonly string[] _assetKeys = new string[] {{ {literal} }};\n"
    );
    code.push_str("        void OnServerInitialized()\n        {\n");
    let _ = writeln!(
        code,
        "            var imagesDir = System.IO.Path.Combine(Interface.Oxide.DataDirectory, \"{class_name}\", \"Images\");"
    );
    code.push_str("            if (!System.IO.Directory.Exists(imagesDir))\n            {\n");
    code.push_str("                System.IO.Directory.CreateDirectory(imagesDir);\n");
    code.push_str("                Puts($\"Created {imagesDir}; place these PNG files there: {string.Join(\", \", _assetKeys)}\");\n");
    code.push_str("            }\n");
    let _ = writeln!(code, "            assets = new UIAssetsLoader(\"{class_name}\", this);");
    code.push_str("            assets.StartLoad(_assetKeys);\n");
    code.push_str("        }\n\n");
    let _ = writeln!(code, "        [ChatCommand(\"{command}assets\")]");
    code.push_str("        void CmdAssets(BasePlayer player, string command, string[] args)\n        {\n");
    code.push_str("            if (assets == null) { player.ChatMessage(\"Assets: loader not initialized\"); return; }\n");
    code.push_str("            if (args != null && args.Length > 0 && args[0] == \"reload\") { assets.Cancel(); assets.StartLoad(_assetKeys); }\n");
    code.push_str("            player.ChatMessage($\"Assets: requested {assets.Requested}, loaded {assets.Loaded}, failed {assets.Failed}\");\n");
    code.push_str("        }\n\n");
}

/// Declares every anchored element; returns how many were written.
fn write_elements(code: &mut String, elements: &[Element], assets: AssetMode) -> usize {
    let mut ids = IdAllocator::new();
    let mut skipped = vec![false; elements.len()];
    let mut declared = 0;
    let indent = "            ";

    for (index, el) in elements.iter().enumerate() {
        let parent_skipped = el.parent.map(|p| skipped[p]).unwrap_or(false);
        let Some(anchor) = el.anchor.filter(|_| !parent_skipped) else {
            skipped[index] = true;
            continue;
        };

        let id = ids.id_for(index, &el.name);
        let parent = match el.parent {
            Some(p) => format!("\"{}\"", ids.id_for(p, &elements[p].name)),
            None => "UIName".to_string(),
        };
        let rect = format!(
            "AnchorMin = \"{}\", AnchorMax = \"{}\", OffsetMin = \"0 0\", OffsetMax = \"0 0\"",
            anchor.min_string(),
            anchor.max_string()
        );
        let label = escape_csharp(&el.source_name);

        match el.components.first() {
            Some(Component::RawImage { url, color }) => {
                let _ = writeln!(code, "{indent}// Image: {label}");
                let _ = writeln!(code, "{indent}elements.Add(new CuiElement");
                let _ = writeln!(code, "{indent}{{");
                let _ = writeln!(code, "{indent}    Name = \"{id}\",");
                let _ = writeln!(code, "{indent}    Parent = {parent},");
                let _ = writeln!(code, "{indent}    Components =");
                let _ = writeln!(code, "{indent}    {{");
                let source = if assets == AssetMode::Data && !url.is_empty() {
                    format!("Png = assets?.Get(\"{}\")", escape_csharp(url))
                } else {
                    format!("Url = \"{}\"", escape_csharp(url))
                };
                let _ = writeln!(
                    code,
                    "{indent}        new CuiRawImageComponent {{ {source}, Color = \"{color}\" }},"
                );
                let _ = writeln!(
                    code,
                    "{indent}        new CuiRectTransformComponent {{ {rect} }}"
                );
                let _ = writeln!(code, "{indent}    }}");
                let _ = writeln!(code, "{indent}}});\n");
            }
            Some(Component::Text {
                text,
                font_size,
                color,
                align,
            }) => {
                let size = font_size.round().max(1.0) as i64;
                let _ = writeln!(code, "{indent}// Text: {label}");
                let _ = writeln!(code, "{indent}elements.Add(new CuiLabel");
                let _ = writeln!(code, "{indent}{{");
                let _ = writeln!(
                    code,
                    "{indent}    Text = {{ Text = \"{}\", FontSize = (int)Mathf.Max(1, Mathf.RoundToInt({size} * s)), Align = TextAnchor.{align}, Color = \"{color}\" }},",
                    escape_csharp(text)
                );
                let _ = writeln!(code, "{indent}    RectTransform = {{ {rect} }}");
                let _ = writeln!(code, "{indent}}}, {parent}, \"{id}\");\n");
            }
            Some(Component::Image { color }) => {
                let _ = writeln!(code, "{indent}// Panel: {label}");
                let _ = writeln!(code, "{indent}elements.Add(new CuiPanel");
                let _ = writeln!(code, "{indent}{{");
                let _ = writeln!(code, "{indent}    Image = {{ Color = \"{color}\" }},");
                let _ = writeln!(code, "{indent}    RectTransform = {{ {rect} }}");
                let _ = writeln!(code, "{indent}}}, {parent}, \"{id}\");\n");
            }
            Some(Component::RectTransform { .. }) | None => {
                skipped[index] = true;
                continue;
            }
        }
        declared += 1;
    }
    declared
}
