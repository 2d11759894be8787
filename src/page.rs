//! The single page served at `/`.

use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(
        r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Visionary AI: Advanced Image Analysis Powered by Gemini AI</title>
    <link rel="icon" href="data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'><text y='.9em' font-size='90'>🔮</text></svg>">
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: #f5f6fa;
            min-height: 100vh;
            display: flex;
        }

        @media (prefers-color-scheme: dark) {
            body { background: #15161c; color: #e6e6e6; }
            .container, .result { background: #1f2029 !important; color: #e6e6e6; }
            textarea { background: #15161c; color: #e6e6e6; }
        }

        .sidebar {
            width: 280px;
            background: linear-gradient(180deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 30px 24px;
            flex-shrink: 0;
        }

        .sidebar h2 { margin-bottom: 8px; }
        .sidebar h4 { font-weight: 500; opacity: 0.9; margin-bottom: 24px; }
        .sidebar ul { list-style: none; line-height: 2; }
        .sidebar hr { border: none; border-top: 1px solid rgba(255,255,255,0.3); margin: 24px 0; }
        .sidebar .caption { font-size: 0.85em; opacity: 0.85; }

        main {
            flex: 1;
            padding: 2rem;
        }

        .container {
            background: white;
            border-radius: 20px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.08);
            max-width: 1000px;
            margin: 0 auto;
            padding: 40px;
        }

        h1 {
            margin-bottom: 10px;
            font-size: 1.8em;
        }

        .subtitle {
            color: #666;
            margin-bottom: 30px;
        }

        .upload-area {
            border: 3px dashed #667eea;
            border-radius: 15px;
            padding: 40px 20px;
            text-align: center;
            cursor: pointer;
            transition: all 0.3s;
            background: #f8f9ff;
            color: #667eea;
        }

        .upload-area.dragover {
            border-color: #764ba2;
            background: #e8ebff;
        }

        .upload-hint { color: #999; font-size: 0.9em; margin-top: 8px; }

        input[type="file"] { display: none; }

        .webcam { margin: 20px 0; }
        .webcam video { display: none; max-width: 100%; border-radius: 10px; margin-top: 10px; }
        .webcam button { display: none; margin-top: 10px; }

        .previews {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(180px, 1fr));
            gap: 16px;
            margin: 20px 0;
        }

        .previews figure { text-align: center; font-size: 0.8em; color: #666; }

        .uploadedImage {
            width: 100%;
            border-radius: 10px;
            box-shadow: 0 4px 8px rgba(0,0,0,0.1);
        }

        label.query { display: block; font-weight: 600; margin: 20px 0 8px; }

        textarea {
            width: 100%;
            height: 100px;
            border-radius: 10px;
            border: 1px solid #ccc;
            padding: 12px;
            font: inherit;
        }

        button {
            width: 100%;
            border: none;
            border-radius: 10px;
            height: 3rem;
            background-color: #4CAF50;
            color: white;
            font-weight: bold;
            cursor: pointer;
            margin-top: 16px;
        }

        button:disabled { opacity: 0.6; cursor: wait; }
        button.secondary { background-color: #667eea; }

        .loading { text-align: center; padding: 30px; display: none; }

        .spinner {
            border: 4px solid #f3f3f3;
            border-top: 4px solid #667eea;
            border-radius: 50%;
            width: 50px;
            height: 50px;
            animation: spin 1s linear infinite;
            margin: 0 auto 20px;
        }

        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }

        .error {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
            display: none;
        }

        .results { display: none; margin-top: 30px; }
        .success { background: #e8f7ec; color: #2e7d32; padding: 12px 16px; border-radius: 10px; margin-bottom: 20px; }

        .result {
            background: #f8f9ff;
            border-radius: 10px;
            padding: 20px;
            margin-top: 16px;
        }

        .result h3 { color: #667eea; margin-bottom: 10px; }
        .result-text { white-space: pre-wrap; line-height: 1.6; }

        .downloads { display: flex; gap: 16px; }

        footer { text-align: center; margin-top: 40px; padding-top: 20px; border-top: 1px solid #eee; color: #888; }
    </style>
</head>
<body>
    <aside class="sidebar">
        <h2>🔮 Visionary AI</h2>
        <h4>Advanced Image Analysis Powered by Gemini AI</h4>
        <strong>Features:</strong>
        <ul>
            <li>Advanced AI-Powered OCR</li>
            <li>Multi-Image Upload Support</li>
            <li>Image Preprocessing for Better OCR</li>
            <li>Text &amp; CSV Export of Results</li>
            <li>Live Webcam Capture</li>
            <li>Dark Mode Support</li>
        </ul>
        <hr>
        <p class="caption">Powered by <strong>Google Gemini AI</strong> 🚀</p>
    </aside>

    <main>
        <div class="container">
            <h1>🌟 Visionary AI: Advanced Image Analysis Powered by Gemini AI</h1>
            <p class="subtitle">Upload images and let Neural Lens extract insights!</p>

            <div class="webcam">
                <label><input type="checkbox" id="useWebcam"> 📷 Capture Image from Webcam</label>
                <video id="webcamVideo" autoplay playsinline></video>
                <button type="button" class="secondary" id="snapButton">Take a picture</button>
            </div>

            <div class="upload-area" id="uploadArea">
                <div>📸 Upload Images (JPEG/PNG)</div>
                <div class="upload-hint">Click or drag files here</div>
                <input type="file" id="fileInput" accept=".jpg,.jpeg,.png,image/jpeg,image/png" multiple>
            </div>

            <div id="uploadedSection" style="display: none">
                <h3 style="margin-top: 20px">Uploaded Images</h3>
                <div class="previews" id="previews"></div>
            </div>

            <label class="query" for="query">What insights do you need from the image?</label>
            <textarea id="query" placeholder="E.g., Extract all text and analyze the content..."></textarea>

            <button type="button" id="analyzeButton">🔍 Analyze with Neural Lens</button>

            <div class="loading" id="loading">
                <div class="spinner"></div>
                <p>🤖 Neural Lens is analyzing...</p>
            </div>

            <div class="error" id="error"></div>

            <div class="results" id="results">
                <div class="success">✨ Analysis Complete!</div>
                <h2>📊 AI Analysis Results</h2>
                <div id="resultList"></div>
                <div class="downloads">
                    <button type="button" class="secondary" id="downloadTxt">📥 Download Analysis (TXT)</button>
                    <button type="button" class="secondary" id="downloadCsv">📥 Download Analysis (CSV)</button>
                </div>
            </div>

            <footer>Created with ❤️ using Rust, Axum &amp; Google Gemini AI</footer>
        </div>
    </main>

    <script>
        const uploadArea = document.getElementById('uploadArea');
        const fileInput = document.getElementById('fileInput');
        const previews = document.getElementById('previews');
        const uploadedSection = document.getElementById('uploadedSection');
        const useWebcam = document.getElementById('useWebcam');
        const webcamVideo = document.getElementById('webcamVideo');
        const snapButton = document.getElementById('snapButton');
        const query = document.getElementById('query');
        const analyzeButton = document.getElementById('analyzeButton');
        const loading = document.getElementById('loading');
        const errorDiv = document.getElementById('error');
        const results = document.getElementById('results');
        const resultList = document.getElementById('resultList');

        let files = [];
        let analyses = [];
        let webcamStream = null;

        uploadArea.addEventListener('click', () => fileInput.click());

        uploadArea.addEventListener('dragover', (e) => {
            e.preventDefault();
            uploadArea.classList.add('dragover');
        });

        uploadArea.addEventListener('dragleave', () => {
            uploadArea.classList.remove('dragover');
        });

        uploadArea.addEventListener('drop', (e) => {
            e.preventDefault();
            uploadArea.classList.remove('dragover');
            addFiles(e.dataTransfer.files);
        });

        fileInput.addEventListener('change', (e) => {
            addFiles(e.target.files);
            fileInput.value = '';
        });

        function addFiles(list) {
            for (const file of list) {
                if (file.type === 'image/jpeg' || file.type === 'image/png') {
                    files.push(file);
                }
            }
            renderPreviews();
        }

        function renderPreviews() {
            previews.innerHTML = '';
            files.forEach((file) => {
                const figure = document.createElement('figure');
                const img = document.createElement('img');
                img.className = 'uploadedImage';
                img.src = URL.createObjectURL(file);
                const caption = document.createElement('figcaption');
                caption.textContent = 'Uploaded Image';
                figure.append(img, caption);
                previews.appendChild(figure);
            });
            uploadedSection.style.display = files.length ? 'block' : 'none';
        }

        useWebcam.addEventListener('change', async () => {
            if (useWebcam.checked) {
                try {
                    webcamStream = await navigator.mediaDevices.getUserMedia({ video: true });
                    webcamVideo.srcObject = webcamStream;
                    webcamVideo.style.display = 'block';
                    snapButton.style.display = 'block';
                } catch (err) {
                    useWebcam.checked = false;
                    showError('Webcam unavailable: ' + err.message);
                }
            } else {
                stopWebcam();
            }
        });

        function stopWebcam() {
            if (webcamStream) {
                webcamStream.getTracks().forEach((t) => t.stop());
                webcamStream = null;
            }
            webcamVideo.style.display = 'none';
            snapButton.style.display = 'none';
        }

        snapButton.addEventListener('click', () => {
            // No frame yet; toBlob would yield null.
            if (!webcamVideo.videoWidth || !webcamVideo.videoHeight) {
                return;
            }
            const canvas = document.createElement('canvas');
            canvas.width = webcamVideo.videoWidth;
            canvas.height = webcamVideo.videoHeight;
            canvas.getContext('2d').drawImage(webcamVideo, 0, 0);
            canvas.toBlob((blob) => {
                if (!blob) {
                    return;
                }
                files.push(new File([blob], 'webcam.png', { type: 'image/png' }));
                renderPreviews();
            }, 'image/png');
        });

        function showMessage(text) {
            errorDiv.textContent = text;
            errorDiv.style.display = 'block';
        }

        function showError(message) {
            showMessage('🚫 Error: ' + message);
        }

        function showWarning(message) {
            showMessage('⚠️ ' + message);
        }

        analyzeButton.addEventListener('click', async () => {
            errorDiv.style.display = 'none';
            results.style.display = 'none';

            if (!query.value.trim()) {
                showWarning('Please enter a query before analyzing.');
                return;
            }
            if (!files.length) {
                showWarning('Please upload at least one image.');
                return;
            }

            const formData = new FormData();
            formData.append('prompt', query.value);
            files.forEach((file) => formData.append('images', file, file.name));

            analyzeButton.disabled = true;
            loading.style.display = 'block';

            try {
                const response = await fetch('/analyze', { method: 'POST', body: formData });
                const body = await response.json().catch(() => ({ error: 'Unexpected server response' }));
                if (!response.ok) {
                    throw new Error(body.error || 'Analysis failed');
                }

                analyses = body.results.map((r) => r.text);
                resultList.innerHTML = '';
                body.results.forEach((r) => {
                    const section = document.createElement('div');
                    section.className = 'result';
                    const heading = document.createElement('h3');
                    heading.textContent = r.label;
                    const text = document.createElement('div');
                    text.className = 'result-text';
                    text.textContent = r.text;
                    section.append(heading, text);
                    resultList.appendChild(section);
                });
                results.style.display = 'block';
            } catch (err) {
                showError(err.message);
            } finally {
                loading.style.display = 'none';
                analyzeButton.disabled = false;
            }
        });

        async function download(path, fileName) {
            try {
                const response = await fetch(path, {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ analyses }),
                });
                if (!response.ok) {
                    throw new Error('Download failed');
                }
                const url = URL.createObjectURL(await response.blob());
                const link = document.createElement('a');
                link.href = url;
                link.download = fileName;
                link.click();
                setTimeout(() => URL.revokeObjectURL(url), 1000);
            } catch (err) {
                showError(err.message);
            }
        }

        document.getElementById('downloadTxt')
            .addEventListener('click', () => download('/export/txt', 'neural_lens_analysis.txt'));
        document.getElementById('downloadCsv')
            .addEventListener('click', () => download('/export/csv', 'neural_lens_analysis.csv'));
    </script>
</body>
</html>
        "#,
    )
}
