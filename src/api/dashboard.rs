//! Single-page web dashboard.
//!
//! The page is static; it loads everything from the JSON API and draws the
//! price and volume charts on canvas.

use crate::AppState;
use axum::{response::Html, routing::get, Router};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET /
async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>stockwatch</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f4f6f8; color: #1d2733; }
  header { background: #1d2733; color: #fff; padding: 16px 24px; }
  header h1 { margin: 0; font-size: 22px; }
  main { padding: 20px 24px; max-width: 1200px; margin: 0 auto; }
  .controls { display: flex; gap: 12px; margin-bottom: 16px; align-items: center; }
  select, button { font-size: 14px; padding: 6px 10px; }
  .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 12px; margin-bottom: 16px; }
  .card { background: #fff; border-radius: 6px; padding: 14px; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
  .card .label { font-size: 12px; color: #6b7785; text-transform: uppercase; }
  .card .value { font-size: 22px; margin-top: 6px; }
  .up { color: #1a8f3c; } .down { color: #c62828; }
  .panel { background: #fff; border-radius: 6px; padding: 14px; margin-bottom: 16px; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
  .panel h2 { font-size: 16px; margin: 0 0 10px; }
  canvas { width: 100%; display: block; }
  table { border-collapse: collapse; width: 100%; font-size: 14px; }
  td { padding: 4px 8px; border-bottom: 1px solid #eef1f4; }
  td:first-child { color: #6b7785; width: 40%; }
  .grid2 { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
  #status { color: #6b7785; font-size: 13px; }
  ul.news { padding-left: 18px; margin: 0; } ul.news li { margin-bottom: 6px; }
</style>
</head>
<body>
<header><h1 id="title">Stock Analysis</h1></header>
<main>
  <div class="controls">
    <label>Symbol <select id="symbol"></select></label>
    <label>Period <select id="period"></select></label>
    <button id="refresh">Refresh</button>
    <span id="status"></span>
  </div>
  <div class="cards">
    <div class="card"><div class="label">Current Price</div><div class="value" id="price">-</div></div>
    <div class="card"><div class="label">Change</div><div class="value" id="change">-</div></div>
    <div class="card"><div class="label">52W High</div><div class="value" id="high">-</div></div>
    <div class="card"><div class="label">52W Low</div><div class="value" id="low">-</div></div>
  </div>
  <div class="panel"><h2>Price</h2><canvas id="priceChart" height="320"></canvas></div>
  <div class="panel"><h2>Volume</h2><canvas id="volumeChart" height="140"></canvas></div>
  <div class="grid2">
    <div class="panel"><h2>Company</h2><table id="company"></table></div>
    <div class="panel"><h2>Technical</h2><table id="technical"></table></div>
  </div>
  <div class="grid2">
    <div class="panel"><h2>Performance</h2><table id="performance"></table></div>
    <div class="panel"><h2>Outlook</h2><table id="outlook"></table></div>
  </div>
  <div class="panel"><h2>News</h2><ul class="news" id="news"></ul></div>
</main>
<script>
const $ = (id) => document.getElementById(id);
const fmt = (v, d = 2) => (v === undefined || v === null) ? "-" : Number(v).toFixed(d);
const pct = (v) => (v === undefined || v === null) ? "-" : (v * 100).toFixed(2) + "%";
const money = (v) => {
  if (v === undefined || v === null) return "-";
  if (v >= 1e9) return "$" + (v / 1e9).toFixed(2) + "B";
  if (v >= 1e6) return "$" + (v / 1e6).toFixed(2) + "M";
  return "$" + Number(v).toFixed(2);
};

function rows(table, entries) {
  $(table).innerHTML = entries
    .map(([k, v]) => `<tr><td>${k}</td><td>${v}</td></tr>`)
    .join("");
}

function setupCanvas(canvas) {
  const ratio = window.devicePixelRatio || 1;
  const width = canvas.clientWidth;
  const height = canvas.getAttribute("height");
  canvas.width = width * ratio;
  canvas.height = height * ratio;
  canvas.style.height = height + "px";
  const ctx = canvas.getContext("2d");
  ctx.scale(ratio, ratio);
  ctx.clearRect(0, 0, width, height);
  return { ctx, width, height: Number(height) };
}

function drawLines(canvas, lines) {
  const { ctx, width, height } = setupCanvas(canvas);
  const values = lines.flatMap((l) => l.values.filter((v) => v !== null && v !== undefined));
  if (values.length === 0) return;
  const min = Math.min(...values), max = Math.max(...values);
  const pad = 40, span = (max - min) || 1;
  const n = lines[0].values.length;
  const x = (i) => pad + (i / Math.max(n - 1, 1)) * (width - pad - 8);
  const y = (v) => 8 + (1 - (v - min) / span) * (height - 24);
  ctx.fillStyle = "#6b7785"; ctx.font = "11px sans-serif";
  ctx.fillText(max.toFixed(2), 2, 14); ctx.fillText(min.toFixed(2), 2, height - 12);
  for (const line of lines) {
    ctx.strokeStyle = line.color; ctx.lineWidth = line.width || 1.2; ctx.beginPath();
    let started = false;
    line.values.forEach((v, i) => {
      if (v === null || v === undefined) { started = false; return; }
      if (started) ctx.lineTo(x(i), y(v)); else { ctx.moveTo(x(i), y(v)); started = true; }
    });
    ctx.stroke();
  }
}

function drawBars(canvas, values, colors) {
  const { ctx, width, height } = setupCanvas(canvas);
  const max = Math.max(...values, 1);
  const pad = 40, w = (width - pad - 8) / Math.max(values.length, 1);
  values.forEach((v, i) => {
    const h = (v / max) * (height - 16);
    ctx.fillStyle = colors[i];
    ctx.fillRect(pad + i * w, height - h, Math.max(w - 1, 1), h);
  });
}

async function getJson(url) {
  const response = await fetch(url);
  const body = await response.json();
  if (!response.ok) throw new Error(body.error || response.statusText);
  return body.data;
}

async function loadPickers() {
  const data = await getJson("/api/symbols");
  $("symbol").innerHTML = data.symbols
    .map((s) => `<option value="${s.symbol}">${s.name}</option>`).join("");
  $("period").innerHTML = data.periods.map((p) => `<option>${p}</option>`).join("");
  $("symbol").value = data.defaultSymbol;
  $("period").value = data.defaultPeriod;
}

async function refresh() {
  const symbol = $("symbol").value, period = $("period").value;
  $("status").textContent = "Loading " + symbol + "...";
  try {
    const [report, chart] = await Promise.all([
      getJson(`/api/analysis/${symbol}?period=${period}`),
      getJson(`/api/indicators/${symbol}?period=${period}`),
    ]);
    render(report, chart);
    $("status").textContent = "Updated " + new Date(report.generatedAt).toLocaleTimeString();
  } catch (e) {
    $("status").textContent = "Error: " + e.message;
  }
}

function render(report, chart) {
  $("title").textContent = report.displayName || report.symbol;
  const p = report.price;
  $("price").textContent = "$" + fmt(p.currentPrice);
  const change = $("change");
  change.textContent = p.change === undefined ? "-" : `${fmt(p.change)} (${fmt(p.changePct)}%)`;
  change.className = "value " + ((p.change || 0) >= 0 ? "up" : "down");
  $("high").textContent = "$" + fmt(p.high52w);
  $("low").textContent = "$" + fmt(p.low52w);

  const series = Object.fromEntries(chart.series.map((s) => [s.name, s.values]));
  drawLines($("priceChart"), [
    { values: chart.bars.map((b) => b.close), color: "#1d6fd6", width: 1.8 },
    { values: series.sma_20 || [], color: "#f29d38" },
    { values: series.sma_50 || [], color: "#8e44ad" },
    { values: series.bb_upper || [], color: "#b0b8c1" },
    { values: series.bb_lower || [], color: "#b0b8c1" },
  ]);
  drawBars($("volumeChart"), chart.bars.map((b) => b.volume || 0),
    chart.bars.map((b) => b.close >= b.open ? "#7cc48f" : "#e58b8b"));

  const c = report.company || {};
  rows("company", [
    ["Name", c.name || "-"], ["Sector", c.sector || "-"], ["Industry", c.industry || "-"],
    ["Market Cap", money(c.marketCap)], ["P/E Ratio", fmt(c.peRatio)],
    ["Dividend Yield", c.dividendYield === undefined ? "-" : pct(c.dividendYield)],
  ]);

  const ind = report.indicators, sig = report.signals || {};
  rows("technical", [
    ["RSI (14)", `${fmt(ind.rsi_14)} ${sig.rsi ? "(" + sig.rsi + ")" : ""}`],
    ["SMA 20", `${fmt(ind.sma_20)} ${sig.priceVsSma20 ? "(price " + sig.priceVsSma20 + ")" : ""}`],
    ["SMA 50", `${fmt(ind.sma_50)} ${sig.priceVsSma50 ? "(price " + sig.priceVsSma50 + ")" : ""}`],
    ["MACD", fmt(ind.macd, 4)], ["Signal", fmt(ind.macd_signal, 4)],
    ["Stochastic %K", fmt(ind.stoch_k)], ["ATR (14)", fmt(ind.atr_14, 4)],
    ["Patterns (recent)", report.patterns ? Object.entries(report.patterns)
      .filter(([, d]) => d.length).map(([k, d]) => `${k}: ${d.length}`).join(", ") || "none" : "none"],
  ]);

  const r = report.returns || {}, d = report.dividends || {};
  rows("performance", [
    ["Total Return", pct(r.totalReturn)], ["Annualized Return", pct(r.annualizedReturn)],
    ["Volatility", pct(r.volatility)], ["Sharpe Ratio", fmt(r.sharpeRatio)],
    ["Max Drawdown", pct(r.maxDrawdown)],
    ["Annual Dividend", d.annualDividend === undefined ? "-" : "$" + fmt(d.annualDividend, 3)],
    ["Dividend Yield", d.currentYield === undefined ? "-" : fmt(d.currentYield) + "%"],
  ]);

  const t = report.trend, v = report.volatility, sr = report.supportResistance, s = report.sentiment;
  rows("outlook", [
    ["Trend", t ? `${t.direction} (r² ${fmt(t.rSquared)})` : "-"],
    ["30-Day Projection", t ? `$${fmt(t.predictedPrice)} (${fmt(t.predictedChangePct)}%)` : "-"],
    ["Support", sr ? sr.support.map((x) => fmt(x)).join(", ") || "-" : "-"],
    ["Resistance", sr ? sr.resistance.map((x) => fmt(x)).join(", ") || "-" : "-"],
    ["Volatility (ann.)", v ? fmt(v.current) + "%" : "-"],
    ["News Sentiment", s ? `${s.label} (${fmt(s.averageCompound)}, ${s.articleCount} articles)` : "-"],
  ]);

  $("news").innerHTML = (report.news || []).slice(0, 10).map((a) =>
    `<li><a href="${a.url}" target="_blank" rel="noopener">${a.title}</a> <small>${a.source}, ${new Date(a.publishedAt).toLocaleDateString()}</small></li>`
  ).join("") || "<li>No recent news</li>";
}

$("refresh").addEventListener("click", refresh);
$("symbol").addEventListener("change", refresh);
$("period").addEventListener("change", refresh);
loadPickers().then(refresh).catch((e) => { $("status").textContent = "Error: " + e.message; });
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_serves_page() {
        let Html(body) = index().await;
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("/api/analysis/"));
        assert!(body.contains("52W High"));
    }
}
