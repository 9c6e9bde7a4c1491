/// Export options consumed by `xcodebuild -exportArchive`.
pub fn export_options_plist(
    method: &str,
    team_id: &str,
    signing_certificate: &str,
    bundle_id: &str,
    profile_name: &str,
) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>method</key>
    <string>{method}</string>
    <key>teamID</key>
    <string>{team_id}</string>
    <key>compileBitcode</key>
    <false/>
    <key>uploadSymbols</key>
    <false/>
    <key>signingCertificate</key>
    <string>{signing_certificate}</string>
    <key>provisioningProfiles</key>
    <dict>
        <key>{bundle_id}</key>
        <string>{profile_name}</string>
    </dict>
</dict>
</plist>
"#,
        method = xml_escape(method),
        team_id = xml_escape(team_id),
        signing_certificate = xml_escape(signing_certificate),
        bundle_id = xml_escape(bundle_id),
        profile_name = xml_escape(profile_name),
    )
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
